//! Remediation ranking.
//!
//! Each topic gets a 0-100 urgency score built from its proficiency gap, trend, overdue
//! review and error streak, damped if it was practiced in the last day. Only topics
//! scoring above [`INCLUSION_PRIORITY`] are reported.

use std::cmp::Ordering;

use crate::mastery::config::MasteryConfig;
use crate::mastery::types::{
    Difficulty, DifficultyBreakdown, DifficultyFocus, ReasonCode, TopicProficiency, Trend,
    WeakArea, DAY_MS,
};

pub const INCLUSION_PRIORITY: f64 = 30.0;
pub const ERROR_PRONE_STREAK: u32 = 3;

const DECLINING_BOOST: f64 = 25.0;
const OVERDUE_BOOST_PER_DAY: f64 = 2.0;
const OVERDUE_BOOST_CAP: f64 = 20.0;
const ERROR_BOOST_PER_MISS: f64 = 5.0;
const RECENCY_DAMPENER: f64 = 0.5;
const LOW_PROFICIENCY: f64 = 0.5;

const BASE_QUESTIONS: f64 = 5.0;
const MIN_QUESTIONS: u32 = 3;
const MAX_QUESTIONS: u32 = 15;
const MINUTES_PER_QUESTION: u32 = 2;

pub fn analyze(records: &[TopicProficiency], now_ms: i64, config: &MasteryConfig) -> Vec<WeakArea> {
    let mut areas: Vec<WeakArea> = records
        .iter()
        .filter_map(|record| {
            let priority = priority(record, now_ms, config);
            if priority <= INCLUSION_PRIORITY {
                return None;
            }

            let recommended_questions = recommended_questions(record, config);
            Some(WeakArea {
                topic_id: record.topic_id.clone(),
                proficiency: record.proficiency,
                priority,
                reason_code: reason_code(record, now_ms),
                recommended_questions,
                estimated_study_time: recommended_questions * MINUTES_PER_QUESTION,
                difficulty_focus: difficulty_focus(&record.difficulty_breakdown),
            })
        })
        .collect();

    // sort_by is stable, equal priorities keep input order
    areas.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(Ordering::Equal));
    areas
}

pub fn priority(record: &TopicProficiency, now_ms: i64, config: &MasteryConfig) -> f64 {
    let mut priority = 0.0;

    if record.proficiency < config.proficiency_threshold {
        priority += (config.proficiency_threshold - record.proficiency) * 100.0;
    }

    if record.trend == Trend::Declining {
        priority += DECLINING_BOOST;
    }

    if record.is_overdue(now_ms) {
        let days_past_due = (now_ms - record.next_review_date) as f64 / DAY_MS as f64;
        priority += (days_past_due * OVERDUE_BOOST_PER_DAY).min(OVERDUE_BOOST_CAP);
    }

    if record.consecutive_incorrect >= ERROR_PRONE_STREAK {
        priority += record.consecutive_incorrect as f64 * ERROR_BOOST_PER_MISS;
    }

    if now_ms - record.last_practiced < DAY_MS {
        priority *= RECENCY_DAMPENER;
    }

    priority.clamp(0.0, 100.0)
}

/// First matching reason wins.
pub fn reason_code(record: &TopicProficiency, now_ms: i64) -> ReasonCode {
    if record.proficiency < LOW_PROFICIENCY {
        ReasonCode::LowProficiency
    } else if record.trend == Trend::Declining {
        ReasonCode::DecliningTrend
    } else if record.consecutive_incorrect >= ERROR_PRONE_STREAK {
        ReasonCode::ErrorProne
    } else if record.is_overdue(now_ms) {
        ReasonCode::NeedsPractice
    } else {
        ReasonCode::LowProficiency
    }
}

pub fn recommended_questions(record: &TopicProficiency, config: &MasteryConfig) -> u32 {
    let gap_factor = 1.0 + config.proficiency_threshold - record.proficiency;
    let uncertainty_factor = 1.0 + (0.5 - record.confidence);
    let raw = (BASE_QUESTIONS * gap_factor * uncertainty_factor).round();

    (raw.max(0.0) as u32).clamp(MIN_QUESTIONS, MAX_QUESTIONS)
}

/// Lowest tier whose success rate is below its bar. Tiers never attempted are skipped;
/// rates are not adjusted for sample size, so 1/1 reads the same as 100/100.
pub fn difficulty_focus(breakdown: &DifficultyBreakdown) -> DifficultyFocus {
    const BARS: [(Difficulty, f64); 3] = [
        (Difficulty::Easy, 0.7),
        (Difficulty::Medium, 0.6),
        (Difficulty::Hard, 0.5),
    ];

    BARS.iter()
        .find(|(difficulty, bar)| {
            breakdown
                .tier(*difficulty)
                .success_rate()
                .is_some_and(|rate| rate < *bar)
        })
        .map(|(difficulty, _)| DifficultyFocus::from(*difficulty))
        .unwrap_or(DifficultyFocus::Mixed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mastery::types::{TierStats, HOUR_MS};

    const NOW: i64 = 1_700_000_000_000;

    fn record(topic: &str, proficiency: f64) -> TopicProficiency {
        let mut record = TopicProficiency::new(topic, NOW - 3 * DAY_MS);
        record.proficiency = proficiency;
        record.confidence = 0.5;
        record.total_attempts = 10;
        record.needs_review = false;
        record.next_review_date = NOW + DAY_MS;
        record
    }

    #[test]
    fn test_gap_only_priority() {
        let config = MasteryConfig::default();
        let r = record("a", 0.2);
        assert!((priority(&r, NOW, &config) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_boosts_accumulate_and_clamp() {
        let config = MasteryConfig::default();
        let mut r = record("a", 0.0);
        r.trend = Trend::Declining;
        r.consecutive_incorrect = 6;
        r.needs_review = true;
        r.next_review_date = NOW - 30 * DAY_MS;
        assert_eq!(priority(&r, NOW, &config), 100.0);
    }

    #[test]
    fn test_overdue_boost_is_capped() {
        let config = MasteryConfig::default();
        let mut r = record("a", 0.4);
        r.needs_review = true;
        r.next_review_date = NOW - 100 * DAY_MS;
        assert!((priority(&r, NOW, &config) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_recent_practice_halves_priority() {
        let config = MasteryConfig::default();
        let mut r = record("a", 0.1);
        r.last_practiced = NOW - HOUR_MS;
        assert!((priority(&r, NOW, &config) - 30.0).abs() < 1e-9);
        assert!(analyze(&[r], NOW, &config).is_empty());
    }

    #[test]
    fn test_reason_code_order() {
        let mut r = record("a", 0.6);
        assert_eq!(reason_code(&r, NOW), ReasonCode::LowProficiency);
        r.needs_review = true;
        r.next_review_date = NOW - HOUR_MS;
        assert_eq!(reason_code(&r, NOW), ReasonCode::NeedsPractice);
        r.consecutive_incorrect = 3;
        assert_eq!(reason_code(&r, NOW), ReasonCode::ErrorProne);
        r.trend = Trend::Declining;
        assert_eq!(reason_code(&r, NOW), ReasonCode::DecliningTrend);
        r.proficiency = 0.3;
        assert_eq!(reason_code(&r, NOW), ReasonCode::LowProficiency);
    }

    #[test]
    fn test_recommended_questions_bounds() {
        let config = MasteryConfig::default();
        let mut r = record("a", 0.0);
        r.confidence = 0.0;
        // 5 * 1.7 * 1.5 = 12.75
        assert_eq!(recommended_questions(&r, &config), 13);

        r.proficiency = 1.0;
        r.confidence = 1.0;
        assert_eq!(recommended_questions(&r, &config), MIN_QUESTIONS);
    }

    #[test]
    fn test_difficulty_focus_skips_unattempted_tiers() {
        let mut breakdown = DifficultyBreakdown::default();
        assert_eq!(difficulty_focus(&breakdown), DifficultyFocus::Mixed);

        breakdown.med = TierStats { correct: 1, total: 4, avg_time: 0.0 };
        assert_eq!(difficulty_focus(&breakdown), DifficultyFocus::Medium);

        breakdown.easy = TierStats { correct: 1, total: 2, avg_time: 0.0 };
        assert_eq!(difficulty_focus(&breakdown), DifficultyFocus::Easy);

        breakdown.easy = TierStats { correct: 9, total: 10, avg_time: 0.0 };
        breakdown.med = TierStats { correct: 8, total: 10, avg_time: 0.0 };
        breakdown.hard = TierStats { correct: 2, total: 10, avg_time: 0.0 };
        assert_eq!(difficulty_focus(&breakdown), DifficultyFocus::Hard);
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let config = MasteryConfig::default();
        let records = vec![
            record("first", 0.2),
            record("high", 0.0),
            record("second", 0.2),
            record("fine", 0.9),
        ];
        let areas = analyze(&records, NOW, &config);
        let ids: Vec<_> = areas.iter().map(|a| a.topic_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "first", "second"]);
        assert_eq!(areas[0].estimated_study_time, areas[0].recommended_questions * 2);
    }
}
