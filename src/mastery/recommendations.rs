use std::cmp::Reverse;

use uuid::Uuid;

use crate::mastery::config::MasteryConfig;
use crate::mastery::types::{
    DifficultyFocus, ExpectedImpact, PracticeRecommendation, RecentSession, RecommendationType,
    TopicProficiency, WeakArea,
};
use crate::mastery::weak_areas;

pub const WEAK_AREAS_PRIORITY: u32 = 90;
pub const SPACED_REVIEW_PRIORITY: u32 = 70;
pub const CHALLENGE_PRIORITY: u32 = 50;
pub const MAINTENANCE_PRIORITY: u32 = 30;

const MAX_WEAK_AREAS: usize = 3;
const REVIEW_QUESTIONS_PER_TOPIC: u32 = 3;
const REVIEW_MINUTES_PER_TOPIC: u32 = 6;

const CHALLENGE_MIN_TOPICS: usize = 3;
const CHALLENGE_MAX_TOPICS: usize = 5;
const CHALLENGE_PROFICIENCY: f64 = 0.8;
const CHALLENGE_CONFIDENCE: f64 = 0.7;
const CHALLENGE_QUESTIONS: u32 = 10;
const CHALLENGE_MINUTES: u32 = 25;

const MAINTENANCE_MAX_TOPICS: usize = 5;
const MAINTENANCE_QUESTIONS: u32 = 10;
const MAINTENANCE_DEFAULT_MINUTES: f64 = 20.0;
const MAINTENANCE_MIN_MINUTES: f64 = 10.0;
const MAINTENANCE_MAX_MINUTES: f64 = 30.0;

const WEAK_AREA_GAIN_FACTOR: f64 = 0.5;
const REVIEW_GAIN: f64 = 0.05;
const CHALLENGE_GAIN: f64 = 0.02;
const MAINTENANCE_GAIN: f64 = 0.01;

/// Build the recommendation batches, highest priority first.
///
/// Equal priorities keep generation order: weak areas, spaced review, challenge.
/// Maintenance only appears when nothing else qualified.
pub fn generate(
    records: &[TopicProficiency],
    recent_sessions: &[RecentSession],
    now_ms: i64,
    config: &MasteryConfig,
) -> Vec<PracticeRecommendation> {
    let weak = weak_areas::analyze(records, now_ms, config);

    let mut recommendations: Vec<PracticeRecommendation> = [
        weak_area_batch(&weak, config),
        spaced_review_batch(records, now_ms, config),
        challenge_batch(records),
    ]
    .into_iter()
    .flatten()
    .collect();

    if recommendations.is_empty() {
        recommendations.extend(maintenance_batch(records, recent_sessions));
    }

    recommendations.sort_by_key(|r| Reverse(r.priority));
    recommendations
}

fn weak_area_batch(weak: &[WeakArea], config: &MasteryConfig) -> Option<PracticeRecommendation> {
    let chosen = &weak[..weak.len().min(MAX_WEAK_AREAS)];
    let top = chosen.first()?;

    let mean_gap = chosen
        .iter()
        .map(|area| (config.proficiency_threshold - area.proficiency).max(0.0))
        .sum::<f64>()
        / chosen.len() as f64;

    let topic_ids: Vec<String> = chosen.iter().map(|a| a.topic_id.clone()).collect();

    Some(PracticeRecommendation {
        id: Uuid::new_v4().to_string(),
        recommendation_type: RecommendationType::WeakAreas,
        question_count: chosen.iter().map(|a| a.recommended_questions).sum(),
        estimated_duration: chosen.iter().map(|a| a.estimated_study_time).sum(),
        target_difficulty: top.difficulty_focus,
        priority: WEAK_AREAS_PRIORITY,
        reasoning: format!(
            "Focus on {} weak area(s): {}",
            topic_ids.len(),
            topic_ids.join(", ")
        ),
        expected_impact: ExpectedImpact {
            proficiency_gain: WEAK_AREA_GAIN_FACTOR * mean_gap,
            weak_areas_addressed: chosen.len(),
        },
        topic_ids,
    })
}

/// Mastered topics that are overdue for a refresh.
fn spaced_review_batch(
    records: &[TopicProficiency],
    now_ms: i64,
    config: &MasteryConfig,
) -> Option<PracticeRecommendation> {
    let topic_ids: Vec<String> = records
        .iter()
        .filter(|r| r.is_overdue(now_ms) && r.proficiency >= config.proficiency_threshold)
        .map(|r| r.topic_id.clone())
        .collect();

    if topic_ids.is_empty() {
        return None;
    }

    let count = topic_ids.len() as u32;
    Some(PracticeRecommendation {
        id: Uuid::new_v4().to_string(),
        recommendation_type: RecommendationType::SpacedReview,
        question_count: count * REVIEW_QUESTIONS_PER_TOPIC,
        estimated_duration: count * REVIEW_MINUTES_PER_TOPIC,
        target_difficulty: DifficultyFocus::Medium,
        priority: SPACED_REVIEW_PRIORITY,
        reasoning: format!("{} mastered topic(s) are due for review", count),
        expected_impact: ExpectedImpact {
            proficiency_gain: REVIEW_GAIN,
            weak_areas_addressed: 0,
        },
        topic_ids,
    })
}

fn challenge_batch(records: &[TopicProficiency]) -> Option<PracticeRecommendation> {
    let strong: Vec<&TopicProficiency> = records
        .iter()
        .filter(|r| r.proficiency >= CHALLENGE_PROFICIENCY && r.confidence >= CHALLENGE_CONFIDENCE)
        .collect();

    if strong.len() < CHALLENGE_MIN_TOPICS {
        return None;
    }

    Some(PracticeRecommendation {
        id: Uuid::new_v4().to_string(),
        recommendation_type: RecommendationType::Challenge,
        topic_ids: strong
            .iter()
            .take(CHALLENGE_MAX_TOPICS)
            .map(|r| r.topic_id.clone())
            .collect(),
        question_count: CHALLENGE_QUESTIONS,
        estimated_duration: CHALLENGE_MINUTES,
        target_difficulty: DifficultyFocus::Hard,
        priority: CHALLENGE_PRIORITY,
        reasoning: format!(
            "Strong performance across {} topics, try harder questions",
            strong.len()
        ),
        expected_impact: ExpectedImpact {
            proficiency_gain: CHALLENGE_GAIN,
            weak_areas_addressed: 0,
        },
    })
}

fn maintenance_batch(
    records: &[TopicProficiency],
    recent_sessions: &[RecentSession],
) -> Option<PracticeRecommendation> {
    if records.is_empty() {
        return None;
    }

    let mut stalest: Vec<&TopicProficiency> = records.iter().collect();
    stalest.sort_by_key(|r| r.last_practiced);

    Some(PracticeRecommendation {
        id: Uuid::new_v4().to_string(),
        recommendation_type: RecommendationType::Maintenance,
        topic_ids: stalest
            .iter()
            .take(MAINTENANCE_MAX_TOPICS)
            .map(|r| r.topic_id.clone())
            .collect(),
        question_count: MAINTENANCE_QUESTIONS,
        estimated_duration: maintenance_minutes(recent_sessions),
        target_difficulty: DifficultyFocus::Mixed,
        priority: MAINTENANCE_PRIORITY,
        reasoning: "No urgent gaps, keep the least recently practiced topics fresh".to_string(),
        expected_impact: ExpectedImpact {
            proficiency_gain: MAINTENANCE_GAIN,
            weak_areas_addressed: 0,
        },
    })
}

fn maintenance_minutes(recent_sessions: &[RecentSession]) -> u32 {
    let durations: Vec<f64> = recent_sessions
        .iter()
        .map(|s| s.duration_minutes)
        .filter(|d| d.is_finite() && *d >= 0.0)
        .collect();

    let minutes = if durations.is_empty() {
        MAINTENANCE_DEFAULT_MINUTES
    } else {
        durations.iter().sum::<f64>() / durations.len() as f64
    };

    minutes
        .clamp(MAINTENANCE_MIN_MINUTES, MAINTENANCE_MAX_MINUTES)
        .round() as u32
}
