use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mastery::error::{MasteryError, MasteryResult};
use crate::mastery::types::Difficulty;
use crate::store::{ConfigStore, StoreError};

/// Key under which the merged configuration is persisted.
pub const CONFIG_KEY: &str = "mastery_config";

const INITIAL_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyWeights {
    pub easy: f64,
    pub med: f64,
    pub hard: f64,
}

impl Default for DifficultyWeights {
    fn default() -> Self {
        Self {
            easy: 0.8,
            med: 1.0,
            hard: 1.2,
        }
    }
}

impl DifficultyWeights {
    pub fn weight(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.med,
            Difficulty::Hard => self.hard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWeights {
    pub fast_bonus: f64,
    pub slow_penalty: f64,
    /// Milliseconds
    pub optimal_time: f64,
}

impl Default for TimeWeights {
    fn default() -> Self {
        Self {
            fast_bonus: 1.1,
            slow_penalty: 0.9,
            optimal_time: 30_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryConfig {
    pub ewma_alpha: f64,
    pub proficiency_threshold: f64,
    /// Attempts needed before an estimate carries full statistical weight
    pub confidence_threshold: f64,
    /// Days
    pub spaced_repetition_base: f64,
    /// Days
    pub max_spaced_interval: f64,
    pub difficulty_weights: DifficultyWeights,
    pub time_weights: TimeWeights,
    pub version: String,
    pub updated_at: i64,
}

impl Default for MasteryConfig {
    fn default() -> Self {
        Self {
            ewma_alpha: 0.3,
            proficiency_threshold: 0.7,
            confidence_threshold: 10.0,
            spaced_repetition_base: 1.0,
            max_spaced_interval: 90.0,
            difficulty_weights: DifficultyWeights::default(),
            time_weights: TimeWeights::default(),
            version: INITIAL_VERSION.to_string(),
            updated_at: 0,
        }
    }
}

impl MasteryConfig {
    pub fn validate(&self) -> MasteryResult<()> {
        if !(self.ewma_alpha > 0.0 && self.ewma_alpha <= 1.0) {
            return Err(MasteryError::InvalidConfig(format!(
                "ewmaAlpha {} must be in (0, 1]",
                self.ewma_alpha
            )));
        }
        if !(self.proficiency_threshold > 0.0 && self.proficiency_threshold < 1.0) {
            return Err(MasteryError::InvalidConfig(format!(
                "proficiencyThreshold {} must be in (0, 1)",
                self.proficiency_threshold
            )));
        }

        let positives = [
            ("confidenceThreshold", self.confidence_threshold),
            ("spacedRepetitionBase", self.spaced_repetition_base),
            ("maxSpacedInterval", self.max_spaced_interval),
            ("difficultyWeights.easy", self.difficulty_weights.easy),
            ("difficultyWeights.med", self.difficulty_weights.med),
            ("difficultyWeights.hard", self.difficulty_weights.hard),
            ("timeWeights.fastBonus", self.time_weights.fast_bonus),
            ("timeWeights.slowPenalty", self.time_weights.slow_penalty),
            ("timeWeights.optimalTime", self.time_weights.optimal_time),
        ];
        for (name, value) in positives {
            if !value.is_finite() || value <= 0.0 {
                return Err(MasteryError::InvalidConfig(format!(
                    "{} must be a positive finite number, got {}",
                    name, value
                )));
            }
        }

        if self.max_spaced_interval < self.spaced_repetition_base {
            return Err(MasteryError::InvalidConfig(format!(
                "maxSpacedInterval {} must not be below spacedRepetitionBase {}",
                self.max_spaced_interval, self.spaced_repetition_base
            )));
        }

        Ok(())
    }

    /// Overlay every field present in `patch`. Metadata is left untouched.
    pub fn with_patch(&self, patch: &MasteryConfigPatch) -> Self {
        let mut next = self.clone();

        if let Some(v) = patch.ewma_alpha {
            next.ewma_alpha = v;
        }
        if let Some(v) = patch.proficiency_threshold {
            next.proficiency_threshold = v;
        }
        if let Some(v) = patch.confidence_threshold {
            next.confidence_threshold = v;
        }
        if let Some(v) = patch.spaced_repetition_base {
            next.spaced_repetition_base = v;
        }
        if let Some(v) = patch.max_spaced_interval {
            next.max_spaced_interval = v;
        }
        if let Some(ref weights) = patch.difficulty_weights {
            if let Some(v) = weights.easy {
                next.difficulty_weights.easy = v;
            }
            if let Some(v) = weights.med {
                next.difficulty_weights.med = v;
            }
            if let Some(v) = weights.hard {
                next.difficulty_weights.hard = v;
            }
        }
        if let Some(ref weights) = patch.time_weights {
            if let Some(v) = weights.fast_bonus {
                next.time_weights.fast_bonus = v;
            }
            if let Some(v) = weights.slow_penalty {
                next.time_weights.slow_penalty = v;
            }
            if let Some(v) = weights.optimal_time {
                next.time_weights.optimal_time = v;
            }
        }

        next
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyWeightsPatch {
    pub easy: Option<f64>,
    pub med: Option<f64>,
    pub hard: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeWeightsPatch {
    pub fast_bonus: Option<f64>,
    pub slow_penalty: Option<f64>,
    pub optimal_time: Option<f64>,
}

/// Partial override accepted by [`crate::mastery::MasteryEngine::update_config`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasteryConfigPatch {
    pub ewma_alpha: Option<f64>,
    pub proficiency_threshold: Option<f64>,
    pub confidence_threshold: Option<f64>,
    pub spaced_repetition_base: Option<f64>,
    pub max_spaced_interval: Option<f64>,
    pub difficulty_weights: Option<DifficultyWeightsPatch>,
    pub time_weights: Option<TimeWeightsPatch>,
}

/// Read the stored blob and merge it onto the defaults.
///
/// Never fails: an unreadable store, a malformed blob or a merged result that does not
/// validate all fall back to [`MasteryConfig::default`].
pub fn load_config(store: &dyn ConfigStore) -> MasteryConfig {
    let stored = match store.get(CONFIG_KEY) {
        Ok(Some(value)) => value,
        Ok(None) => {
            tracing::debug!(key = CONFIG_KEY, "no stored mastery config, using defaults");
            return MasteryConfig::default();
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to read mastery config, using defaults");
            return MasteryConfig::default();
        }
    };

    let config = merge_onto_defaults(&stored);
    match config.validate() {
        Ok(()) => {
            tracing::debug!(version = %config.version, "loaded mastery config");
            config
        }
        Err(e) => {
            tracing::warn!(error = %e, "stored mastery config is invalid, using defaults");
            MasteryConfig::default()
        }
    }
}

pub fn persist_config(store: &dyn ConfigStore, config: &MasteryConfig) -> Result<(), StoreError> {
    let value = serde_json::to_value(config)?;
    store.set(CONFIG_KEY, &value)
}

/// Field-by-field merge: only keys known to the defaults and carrying the same JSON
/// type are taken from `stored`. Integer fields additionally require an integer.
pub fn merge_onto_defaults(stored: &Value) -> MasteryConfig {
    let defaults = MasteryConfig::default();
    let mut merged = match serde_json::to_value(&defaults) {
        Ok(value) => value,
        Err(_) => return defaults,
    };
    merge_lenient(&mut merged, stored);

    match serde_json::from_value(merged) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "stored mastery config could not be decoded");
            defaults
        }
    }
}

fn merge_lenient(base: &mut Value, overlay: &Value) {
    if let (Value::Object(base_map), Value::Object(overlay_map)) = (&mut *base, overlay) {
        for (key, incoming) in overlay_map {
            if let Some(slot) = base_map.get_mut(key) {
                merge_lenient(slot, incoming);
            }
        }
        return;
    }

    if base.is_object() || std::mem::discriminant(&*base) != std::mem::discriminant(overlay) {
        return;
    }

    if base.is_i64() && overlay.as_i64().is_none() {
        return;
    }
    *base = overlay.clone();
}

pub(crate) fn increment_version(version: &str) -> String {
    let parts: Vec<u32> = version
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();

    if parts.len() >= 3 {
        format!("{}.{}.{}", parts[0], parts[1], parts[2].saturating_add(1))
    } else {
        "1.0.1".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_defaults_validate() {
        assert!(MasteryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_blob_merges_onto_defaults() {
        let stored = json!({
            "ewmaAlpha": 0.5,
            "difficultyWeights": { "hard": 1.5 },
            "unknownField": 12
        });
        let config = merge_onto_defaults(&stored);
        assert_eq!(config.ewma_alpha, 0.5);
        assert_eq!(config.difficulty_weights.hard, 1.5);
        assert_eq!(config.difficulty_weights.easy, 0.8);
        assert_eq!(config.proficiency_threshold, 0.7);
    }

    #[test]
    fn test_mistyped_fields_are_ignored() {
        let stored = json!({
            "ewmaAlpha": "fast",
            "timeWeights": 7,
            "proficiencyThreshold": 0.6
        });
        let config = merge_onto_defaults(&stored);
        assert_eq!(config.ewma_alpha, 0.3);
        assert_eq!(config.time_weights, TimeWeights::default());
        assert_eq!(config.proficiency_threshold, 0.6);
    }

    #[test]
    fn test_fractional_timestamp_keeps_other_overrides() {
        let stored = json!({
            "updatedAt": 1.5,
            "ewmaAlpha": 0.45,
            "confidenceThreshold": 12
        });
        let config = merge_onto_defaults(&stored);
        assert_eq!(config.updated_at, MasteryConfig::default().updated_at);
        assert_eq!(config.ewma_alpha, 0.45);
        assert_eq!(config.confidence_threshold, 12.0);
    }

    #[test]
    fn test_non_object_blob_yields_defaults() {
        let config = merge_onto_defaults(&json!([1, 2, 3]));
        assert_eq!(config, MasteryConfig::default());
    }

    #[test]
    fn test_invalid_stored_config_falls_back() {
        let store = MemoryStore::with_entry(CONFIG_KEY, json!({ "ewmaAlpha": 3.0 }));
        let config = load_config(&store);
        assert_eq!(config.ewma_alpha, 0.3);
    }

    #[test]
    fn test_validate_rejects_inverted_intervals() {
        let config = MasteryConfig {
            spaced_repetition_base: 10.0,
            max_spaced_interval: 5.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MasteryError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_non_finite_weight() {
        let mut config = MasteryConfig::default();
        config.time_weights.fast_bonus = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_patch_only_touches_present_fields() {
        let patch = MasteryConfigPatch {
            proficiency_threshold: Some(0.65),
            time_weights: Some(TimeWeightsPatch {
                optimal_time: Some(20_000.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let next = MasteryConfig::default().with_patch(&patch);
        assert_eq!(next.proficiency_threshold, 0.65);
        assert_eq!(next.time_weights.optimal_time, 20_000.0);
        assert_eq!(next.time_weights.fast_bonus, 1.1);
        assert_eq!(next.ewma_alpha, 0.3);
    }

    #[test]
    fn test_increment_version() {
        assert_eq!(increment_version("1.0.0"), "1.0.1");
        assert_eq!(increment_version("2.3.9"), "2.3.10");
        assert_eq!(increment_version("garbage"), "1.0.1");
        assert_eq!(increment_version("1.0.4294967295"), "1.0.4294967295");
    }
}
