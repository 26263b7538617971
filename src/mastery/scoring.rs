//! Proficiency, confidence and trend estimation.
//!
//! Proficiency is an EWMA of a difficulty- and time-weighted score whose smoothing rate
//! is itself scaled by how many attempts preceded this one, so a topic's first answer
//! only starts accumulating weight instead of swinging the estimate.

use crate::mastery::config::MasteryConfig;
use crate::mastery::types::{Difficulty, Trend};

pub const DEFAULT_TREND_WINDOW: usize = 10;

const MIN_TREND_POINTS: usize = 3;
const STABLE_SLOPE: f64 = 0.01;
const FAST_RATIO: f64 = 0.7;
const SLOW_RATIO: f64 = 2.0;

/// Multiplier for a correct answer given how long it took. Misses always get 1.0.
pub fn time_multiplier(is_correct: bool, time_spent_ms: f64, config: &MasteryConfig) -> f64 {
    if !is_correct {
        return 1.0;
    }

    let optimal = config.time_weights.optimal_time;
    if time_spent_ms < FAST_RATIO * optimal {
        config.time_weights.fast_bonus
    } else if time_spent_ms > SLOW_RATIO * optimal {
        config.time_weights.slow_penalty
    } else {
        1.0
    }
}

pub fn weighted_score(
    is_correct: bool,
    difficulty: Difficulty,
    time_spent_ms: f64,
    config: &MasteryConfig,
) -> f64 {
    let base_score = if is_correct { 1.0 } else { 0.0 };
    base_score
        * config.difficulty_weights.weight(difficulty)
        * time_multiplier(is_correct, time_spent_ms, config)
}

/// `prior_attempts` is the attempt count before this answer.
pub fn new_proficiency(
    current: f64,
    is_correct: bool,
    difficulty: Difficulty,
    time_spent_ms: f64,
    prior_attempts: u32,
    config: &MasteryConfig,
) -> f64 {
    let score = weighted_score(is_correct, difficulty, time_spent_ms, config);
    let confidence_weight = sample_weight(prior_attempts, config);
    let alpha = config.ewma_alpha * confidence_weight;

    (alpha * score + (1.0 - alpha) * current).clamp(0.0, 1.0)
}

/// Sample-size confidence damped near the extremes by `4p(1-p)`.
pub fn confidence(total_attempts: u32, proficiency: f64, config: &MasteryConfig) -> f64 {
    if total_attempts == 0 {
        return 0.0;
    }

    let p = proficiency.clamp(0.0, 1.0);
    let extremeness_penalty = 4.0 * p * (1.0 - p);
    (sample_weight(total_attempts, config) * extremeness_penalty).clamp(0.0, 1.0)
}

/// OLS slope over the last `window` snapshots (oldest first).
pub fn trend(history: &[f64], window: usize) -> Trend {
    if history.len() < MIN_TREND_POINTS || window < MIN_TREND_POINTS {
        return Trend::Unknown;
    }

    let start = history.len().saturating_sub(window);
    let points = &history[start..];

    match regression_slope(points) {
        None => Trend::Stable,
        Some(slope) if slope.abs() < STABLE_SLOPE => Trend::Stable,
        Some(slope) if slope > 0.0 => Trend::Improving,
        Some(_) => Trend::Declining,
    }
}

fn regression_slope(values: &[f64]) -> Option<f64> {
    let n = values.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;

    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return None;
    }
    Some((n * sum_xy - sum_x * sum_y) / denominator)
}

fn sample_weight(attempts: u32, config: &MasteryConfig) -> f64 {
    (attempts as f64 / config.confidence_threshold).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> MasteryConfig {
        MasteryConfig::default()
    }

    #[test]
    fn test_first_attempt_does_not_move_proficiency() {
        let p = new_proficiency(0.5, true, Difficulty::Hard, 10_000.0, 0, &cfg());
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_hard_correct_beats_easy_correct() {
        let hard = new_proficiency(0.5, true, Difficulty::Hard, 25_000.0, 10, &cfg());
        let easy = new_proficiency(0.5, true, Difficulty::Easy, 25_000.0, 10, &cfg());
        assert!(hard > easy);
    }

    #[test]
    fn test_incorrect_ignores_timing() {
        let config = cfg();
        assert_eq!(time_multiplier(false, 1.0, &config), 1.0);
        assert_eq!(time_multiplier(false, 1e9, &config), 1.0);
        assert_eq!(time_multiplier(true, 1_000.0, &config), 1.1);
        assert_eq!(time_multiplier(true, 100_000.0, &config), 0.9);
        assert_eq!(time_multiplier(true, 30_000.0, &config), 1.0);
    }

    #[test]
    fn test_full_weight_ewma_step() {
        // alpha 0.3, weight 1.0 (med, on time), prior 0.5 -> 0.3 + 0.35
        let p = new_proficiency(0.5, true, Difficulty::Medium, 30_000.0, 20, &cfg());
        assert!((p - 0.65).abs() < 1e-9);

        let miss = new_proficiency(0.5, false, Difficulty::Medium, 30_000.0, 20, &cfg());
        assert!((miss - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_proficiency_is_clamped() {
        let config = MasteryConfig {
            ewma_alpha: 1.0,
            ..Default::default()
        };
        let p = new_proficiency(1.0, true, Difficulty::Hard, 1.0, 50, &config);
        assert_eq!(p, 1.0);
    }

    #[test]
    fn test_confidence_properties() {
        let config = cfg();
        assert_eq!(confidence(0, 0.5, &config), 0.0);
        assert!((confidence(10, 0.5, &config) - 1.0).abs() < 1e-12);
        assert!(confidence(5, 0.5, &config) >= confidence(5, 0.05, &config));
        assert!(confidence(40, 1.0, &config).abs() < 1e-12);
    }

    #[test]
    fn test_trend_classification() {
        assert_eq!(trend(&[0.3, 0.4, 0.5, 0.6, 0.7], DEFAULT_TREND_WINDOW), Trend::Improving);
        assert_eq!(trend(&[0.8, 0.7, 0.6, 0.5, 0.4], DEFAULT_TREND_WINDOW), Trend::Declining);
        assert_eq!(trend(&[0.7, 0.71, 0.69, 0.7, 0.72], DEFAULT_TREND_WINDOW), Trend::Stable);
        assert_eq!(trend(&[0.5, 0.6], DEFAULT_TREND_WINDOW), Trend::Unknown);
    }

    #[test]
    fn test_trend_uses_only_recent_window() {
        let mut history = vec![0.9, 0.8, 0.7, 0.6, 0.5];
        history.extend([0.3, 0.4, 0.5]);
        assert_eq!(trend(&history, 3), Trend::Improving);
        assert_eq!(trend(&history, 2), Trend::Unknown);
    }
}
