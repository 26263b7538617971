use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::mastery::config::{
    increment_version, load_config, persist_config, MasteryConfig, MasteryConfigPatch,
};
use crate::mastery::error::{MasteryError, MasteryResult};
use crate::mastery::types::{
    Difficulty, PracticeRecommendation, ProficiencyUpdate, QuestionAttempt, RecentSession,
    TopicProficiency, Trend, WeakArea,
};
use crate::mastery::{processor, recommendations, scheduler, scoring, weak_areas};
use crate::store::ConfigStore;

/// Owns the active configuration and its backing store.
///
/// The configuration is loaded once at construction. All computations read a snapshot
/// of it; [`MasteryEngine::update_config`] holds the write lock across
/// merge, install and persist so concurrent updates are serialized.
pub struct MasteryEngine {
    store: Arc<dyn ConfigStore>,
    config: RwLock<MasteryConfig>,
}

impl MasteryEngine {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        let config = load_config(store.as_ref());
        Self {
            store,
            config: RwLock::new(config),
        }
    }

    pub fn config(&self) -> MasteryConfig {
        self.config.read().clone()
    }

    /// Apply `patch`, install the result and persist it.
    ///
    /// A patch that yields an invalid config is rejected and nothing changes. A
    /// persistence failure is returned as [`MasteryError::ConfigPersist`] but the new
    /// config stays active in memory.
    pub fn update_config(&self, patch: &MasteryConfigPatch) -> MasteryResult<MasteryConfig> {
        let mut guard = self.config.write();

        let mut next = guard.with_patch(patch);
        next.validate()?;
        next.version = increment_version(&guard.version);
        next.updated_at = chrono::Utc::now().timestamp_millis();

        *guard = next.clone();

        if let Err(e) = persist_config(self.store.as_ref(), &next) {
            tracing::warn!(error = %e, version = %next.version, "mastery config applied but not persisted");
            return Err(MasteryError::ConfigPersist(e));
        }

        tracing::info!(version = %next.version, "mastery config updated");
        Ok(next)
    }

    /// Re-read the store, replacing the in-memory config.
    pub fn reload_config(&self) -> MasteryConfig {
        let loaded = load_config(self.store.as_ref());
        *self.config.write() = loaded.clone();
        loaded
    }

    pub fn new_proficiency(
        &self,
        current: f64,
        is_correct: bool,
        difficulty: Difficulty,
        time_spent_ms: i64,
        total_attempts: u32,
    ) -> MasteryResult<f64> {
        if time_spent_ms < 0 {
            return Err(MasteryError::InvalidAttempt(format!(
                "time spent {}ms is negative",
                time_spent_ms
            )));
        }
        if !current.is_finite() {
            return Err(MasteryError::InvalidAttempt(format!(
                "current proficiency {} is not finite",
                current
            )));
        }

        let config = self.config.read();
        Ok(scoring::new_proficiency(
            current.clamp(0.0, 1.0),
            is_correct,
            difficulty,
            time_spent_ms as f64,
            total_attempts,
            &config,
        ))
    }

    pub fn confidence(&self, total_attempts: u32, proficiency: f64) -> f64 {
        scoring::confidence(total_attempts, proficiency, &self.config.read())
    }

    pub fn trend(&self, history: &[f64], window: usize) -> Trend {
        scoring::trend(history, window)
    }

    pub fn next_review_date(&self, proficiency: f64, consecutive_correct: u32, last_practiced: i64) -> i64 {
        scheduler::next_review_date(proficiency, consecutive_correct, last_practiced, &self.config.read())
    }

    pub fn weak_areas(&self, records: &[TopicProficiency]) -> Vec<WeakArea> {
        self.weak_areas_at(records, chrono::Utc::now().timestamp_millis())
    }

    pub fn weak_areas_at(&self, records: &[TopicProficiency], now_ms: i64) -> Vec<WeakArea> {
        weak_areas::analyze(records, now_ms, &self.config.read())
    }

    pub fn recommendations(
        &self,
        records: &[TopicProficiency],
        recent_sessions: &[RecentSession],
    ) -> Vec<PracticeRecommendation> {
        self.recommendations_at(records, recent_sessions, chrono::Utc::now().timestamp_millis())
    }

    pub fn recommendations_at(
        &self,
        records: &[TopicProficiency],
        recent_sessions: &[RecentSession],
        now_ms: i64,
    ) -> Vec<PracticeRecommendation> {
        recommendations::generate(records, recent_sessions, now_ms, &self.config.read())
    }

    pub fn process_attempt(
        &self,
        attempt: &QuestionAttempt,
        current: &HashMap<String, TopicProficiency>,
    ) -> MasteryResult<Vec<ProficiencyUpdate>> {
        let result = processor::process_attempt(attempt, current, &self.config.read());
        log_attempt_outcome(attempt, &result);
        result
    }

    pub fn process_attempt_with_history(
        &self,
        attempt: &QuestionAttempt,
        current: &HashMap<String, TopicProficiency>,
        history: &HashMap<String, Vec<f64>>,
    ) -> MasteryResult<Vec<ProficiencyUpdate>> {
        let result =
            processor::process_attempt_with_history(attempt, current, history, &self.config.read());
        log_attempt_outcome(attempt, &result);
        result
    }
}

fn log_attempt_outcome(attempt: &QuestionAttempt, result: &MasteryResult<Vec<ProficiencyUpdate>>) {
    match result {
        Ok(updates) => tracing::debug!(
            question_id = %attempt.question_id,
            topics = updates.len(),
            is_correct = attempt.is_correct,
            "processed attempt"
        ),
        Err(e) => tracing::warn!(question_id = %attempt.question_id, error = %e, "rejected attempt"),
    }
}
