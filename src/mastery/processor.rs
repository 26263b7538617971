//! Per-attempt state transition.
//!
//! Every topic tagged on an attempt is updated independently from its own snapshot;
//! the caller persists the returned updates and owns any conflict handling.

use std::collections::{HashMap, HashSet};

use crate::mastery::config::MasteryConfig;
use crate::mastery::error::{MasteryError, MasteryResult};
use crate::mastery::scoring::{self, DEFAULT_TREND_WINDOW};
use crate::mastery::scheduler;
use crate::mastery::types::{
    running_mean, ProficiencyUpdate, QuestionAttempt, TopicProficiency,
};
use crate::mastery::weak_areas::ERROR_PRONE_STREAK;

pub fn process_attempt(
    attempt: &QuestionAttempt,
    current: &HashMap<String, TopicProficiency>,
    config: &MasteryConfig,
) -> MasteryResult<Vec<ProficiencyUpdate>> {
    validate_attempt(attempt)?;

    unique_topics(&attempt.topic_ids)
        .into_iter()
        .map(|topic_id| {
            let prior = prior_record(topic_id, current, attempt.attempt_date)?;
            Ok(update_topic(&prior, attempt, config))
        })
        .collect()
}

/// Same as [`process_attempt`], additionally appending each new proficiency to the
/// topic's snapshot history (oldest first) and recomputing its trend.
pub fn process_attempt_with_history(
    attempt: &QuestionAttempt,
    current: &HashMap<String, TopicProficiency>,
    history: &HashMap<String, Vec<f64>>,
    config: &MasteryConfig,
) -> MasteryResult<Vec<ProficiencyUpdate>> {
    let mut updates = process_attempt(attempt, current, config)?;

    for update in updates.iter_mut() {
        let mut snapshots = history.get(&update.topic_id).cloned().unwrap_or_default();
        snapshots.push(update.proficiency);
        update.trend = Some(scoring::trend(&snapshots, DEFAULT_TREND_WINDOW));
    }

    Ok(updates)
}

pub fn validate_attempt(attempt: &QuestionAttempt) -> MasteryResult<()> {
    if attempt.question_id.trim().is_empty() {
        return Err(MasteryError::InvalidAttempt("question id is empty".to_string()));
    }
    if attempt.time_spent_ms < 0 {
        return Err(MasteryError::InvalidAttempt(format!(
            "time spent {}ms is negative",
            attempt.time_spent_ms
        )));
    }
    if attempt.topic_ids.iter().any(|t| t.trim().is_empty()) {
        return Err(MasteryError::InvalidAttempt("topic id is empty".to_string()));
    }
    Ok(())
}

/// Reject values the formulas cannot work with; clamp the ones that are merely out of
/// range.
pub fn sanitize_record(record: &TopicProficiency) -> MasteryResult<TopicProficiency> {
    let invalid = |reason: String| MasteryError::InvalidRecord {
        topic_id: record.topic_id.clone(),
        reason,
    };

    if !record.proficiency.is_finite() {
        return Err(invalid(format!("proficiency {} is not finite", record.proficiency)));
    }
    if !record.confidence.is_finite() {
        return Err(invalid(format!("confidence {} is not finite", record.confidence)));
    }
    if !record.average_time_spent.is_finite() {
        return Err(invalid("average time spent is not finite".to_string()));
    }
    if record.correct_attempts > record.total_attempts {
        return Err(invalid(format!(
            "{} correct out of {} attempts",
            record.correct_attempts, record.total_attempts
        )));
    }

    let breakdown = &record.difficulty_breakdown;
    for tier in [&breakdown.easy, &breakdown.med, &breakdown.hard] {
        if tier.correct > tier.total {
            return Err(invalid(format!(
                "difficulty tier has {} correct out of {}",
                tier.correct, tier.total
            )));
        }
    }

    let mut clean = record.clone();
    clean.proficiency = record.proficiency.clamp(0.0, 1.0);
    clean.confidence = record.confidence.clamp(0.0, 1.0);
    clean.average_time_spent = record.average_time_spent.max(0.0);
    Ok(clean)
}

fn prior_record(
    topic_id: &str,
    current: &HashMap<String, TopicProficiency>,
    now_ms: i64,
) -> MasteryResult<TopicProficiency> {
    match current.get(topic_id) {
        Some(record) if record.topic_id != topic_id => Err(MasteryError::InvalidRecord {
            topic_id: topic_id.to_string(),
            reason: format!("stored under key for topic {}", record.topic_id),
        }),
        Some(record) => sanitize_record(record),
        None => Ok(TopicProficiency::new(topic_id, now_ms)),
    }
}

fn update_topic(
    prior: &TopicProficiency,
    attempt: &QuestionAttempt,
    config: &MasteryConfig,
) -> ProficiencyUpdate {
    let time_spent = attempt.time_spent_ms as f64;

    let proficiency = scoring::new_proficiency(
        prior.proficiency,
        attempt.is_correct,
        attempt.difficulty,
        time_spent,
        prior.total_attempts,
        config,
    );

    let (consecutive_correct, consecutive_incorrect) = if attempt.is_correct {
        (prior.consecutive_correct.saturating_add(1), 0)
    } else {
        (0, prior.consecutive_incorrect.saturating_add(1))
    };

    let mut difficulty_breakdown = prior.difficulty_breakdown;
    difficulty_breakdown
        .tier_mut(attempt.difficulty)
        .record(attempt.is_correct, time_spent);

    let total_attempts = prior.total_attempts.saturating_add(1);
    let correct_attempts = prior
        .correct_attempts
        .saturating_add(u32::from(attempt.is_correct));
    let average_time_spent =
        running_mean(prior.average_time_spent, prior.total_attempts as f64, time_spent);

    let last_practiced = attempt.attempt_date;

    ProficiencyUpdate {
        topic_id: prior.topic_id.clone(),
        proficiency,
        confidence: scoring::confidence(total_attempts, proficiency, config),
        total_attempts,
        correct_attempts,
        last_practiced,
        consecutive_correct,
        consecutive_incorrect,
        average_time_spent,
        difficulty_breakdown,
        needs_review: proficiency < config.proficiency_threshold
            || consecutive_incorrect >= ERROR_PRONE_STREAK,
        next_review_date: scheduler::next_review_date(
            proficiency,
            consecutive_correct,
            last_practiced,
            config,
        ),
        trend: None,
    }
}

fn unique_topics(topic_ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    topic_ids
        .iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect()
}
