use crate::mastery::config::MasteryConfig;
use crate::mastery::types::DAY_MS;

const MAX_STREAK_DOUBLINGS: u32 = 6;
const MIN_PROFICIENCY_MULTIPLIER: f64 = 0.5;

/// Review interval in days; doubles per consecutive correct answer up to 64x.
pub fn interval_days(proficiency: f64, consecutive_correct: u32, config: &MasteryConfig) -> f64 {
    let proficiency_multiplier = proficiency.max(MIN_PROFICIENCY_MULTIPLIER);
    let streak_multiplier = 2f64.powi(consecutive_correct.min(MAX_STREAK_DOUBLINGS) as i32);

    (config.spaced_repetition_base * proficiency_multiplier * streak_multiplier)
        .min(config.max_spaced_interval)
}

pub fn next_review_date(
    proficiency: f64,
    consecutive_correct: u32,
    last_practiced: i64,
    config: &MasteryConfig,
) -> i64 {
    let days = interval_days(proficiency, consecutive_correct, config);
    last_practiced + (days * DAY_MS as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn test_mastered_streak_outlasts_weak_topic() {
        let config = MasteryConfig::default();
        assert!(next_review_date(0.9, 3, T0, &config) > next_review_date(0.3, 0, T0, &config));
    }

    #[test]
    fn test_interval_grows_with_streak_until_cap() {
        let config = MasteryConfig::default();
        let mut previous = 0.0;
        for streak in 0..=MAX_STREAK_DOUBLINGS {
            let days = interval_days(0.8, streak, &config);
            assert!(days > previous, "streak {streak} gave {days}");
            previous = days;
        }
        assert_eq!(interval_days(0.8, 7, &config), interval_days(0.8, 6, &config));
    }

    #[test]
    fn test_low_proficiency_floor_and_max_cap() {
        let config = MasteryConfig::default();
        assert_eq!(interval_days(0.1, 0, &config), interval_days(0.5, 0, &config));

        let capped = MasteryConfig {
            max_spaced_interval: 10.0,
            ..Default::default()
        };
        assert_eq!(interval_days(1.0, 6, &capped), 10.0);
    }

    #[test]
    fn test_next_review_date_in_millis() {
        let config = MasteryConfig::default();
        // base 1 day * 0.5 * 2^1
        assert_eq!(next_review_date(0.5, 1, T0, &config), T0 + DAY_MS);
    }
}
