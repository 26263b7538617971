#![allow(dead_code)]

use std::sync::Arc;

use quiz_mastery::mastery::{TopicProficiency, Trend, DAY_MS, HOUR_MS};
use quiz_mastery::{MasteryEngine, MemoryStore};

pub const FIXED_NOW: i64 = 1_700_000_000_000;

pub fn engine() -> MasteryEngine {
    MasteryEngine::new(Arc::new(MemoryStore::new()))
}

pub fn topic(topic_id: &str, proficiency: f64) -> TopicProficiency {
    let mut record = TopicProficiency::new(topic_id, FIXED_NOW - 2 * DAY_MS);
    record.proficiency = proficiency;
    record.confidence = 0.6;
    record.total_attempts = 12;
    record.correct_attempts = (12.0 * proficiency).round() as u32;
    record.needs_review = false;
    record.next_review_date = FIXED_NOW + 3 * DAY_MS;
    record.trend = Trend::Stable;
    record
}

/// Declining, error-prone topic overdue by an hour next to a healthy one.
pub fn two_topic_history() -> Vec<TopicProficiency> {
    let mut struggling = topic("topic1", 0.4);
    struggling.trend = Trend::Declining;
    struggling.consecutive_incorrect = 3;
    struggling.needs_review = true;
    struggling.next_review_date = FIXED_NOW - HOUR_MS;

    let healthy = topic("topic2", 0.85);

    vec![struggling, healthy]
}
