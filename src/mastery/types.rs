use serde::{Deserialize, Serialize};

pub const DAY_MS: i64 = 86_400_000;
pub const HOUR_MS: i64 = 3_600_000;

pub const DEFAULT_PROFICIENCY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[serde(rename = "med", alias = "medium")]
    Medium,
    Hard,
}

/// Per-difficulty counters for one topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierStats {
    pub correct: u32,
    pub total: u32,
    /// Running mean in milliseconds
    pub avg_time: f64,
}

impl TierStats {
    /// `None` when the tier has never been attempted.
    pub fn success_rate(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct as f64 / self.total as f64)
        }
    }

    pub fn record(&mut self, is_correct: bool, time_spent_ms: f64) {
        let previous = self.total as f64;
        self.total = self.total.saturating_add(1);
        if is_correct {
            self.correct = self.correct.saturating_add(1);
        }
        self.avg_time = running_mean(self.avg_time, previous, time_spent_ms);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DifficultyBreakdown {
    pub easy: TierStats,
    pub med: TierStats,
    pub hard: TierStats,
}

impl DifficultyBreakdown {
    pub fn tier(&self, difficulty: Difficulty) -> &TierStats {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.med,
            Difficulty::Hard => &self.hard,
        }
    }

    pub fn tier_mut(&mut self, difficulty: Difficulty) -> &mut TierStats {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.med,
            Difficulty::Hard => &mut self.hard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
    #[default]
    Unknown,
}

/// Proficiency state for one (user, topic) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProficiency {
    pub topic_id: String,
    pub proficiency: f64,
    pub confidence: f64,
    pub total_attempts: u32,
    pub correct_attempts: u32,
    /// Epoch milliseconds
    pub last_practiced: i64,
    pub consecutive_correct: u32,
    pub consecutive_incorrect: u32,
    /// Running mean in milliseconds
    pub average_time_spent: f64,
    #[serde(default)]
    pub difficulty_breakdown: DifficultyBreakdown,
    #[serde(default)]
    pub trend: Trend,
    pub needs_review: bool,
    /// Epoch milliseconds
    pub next_review_date: i64,
}

impl TopicProficiency {
    /// Neutral record for a topic that has never been attempted: due for review tomorrow.
    pub fn new(topic_id: impl Into<String>, now_ms: i64) -> Self {
        Self {
            topic_id: topic_id.into(),
            proficiency: DEFAULT_PROFICIENCY,
            confidence: 0.0,
            total_attempts: 0,
            correct_attempts: 0,
            last_practiced: now_ms,
            consecutive_correct: 0,
            consecutive_incorrect: 0,
            average_time_spent: 0.0,
            difficulty_breakdown: DifficultyBreakdown::default(),
            trend: Trend::Unknown,
            needs_review: true,
            next_review_date: now_ms + DAY_MS,
        }
    }

    pub fn is_overdue(&self, now_ms: i64) -> bool {
        self.needs_review && now_ms > self.next_review_date
    }
}

/// One answered question, as reported by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAttempt {
    pub question_id: String,
    pub topic_ids: Vec<String>,
    pub is_correct: bool,
    pub time_spent_ms: i64,
    pub difficulty: Difficulty,
    /// Epoch milliseconds
    pub attempt_date: i64,
}

/// Fields recomputed for one topic by a single attempt.
///
/// `trend` is `None` unless the caller supplied a proficiency history; applying the
/// update then keeps the previous trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProficiencyUpdate {
    pub topic_id: String,
    pub proficiency: f64,
    pub confidence: f64,
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub last_practiced: i64,
    pub consecutive_correct: u32,
    pub consecutive_incorrect: u32,
    pub average_time_spent: f64,
    pub difficulty_breakdown: DifficultyBreakdown,
    pub needs_review: bool,
    pub next_review_date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

impl ProficiencyUpdate {
    pub fn apply(&self, previous: &TopicProficiency) -> TopicProficiency {
        TopicProficiency {
            topic_id: self.topic_id.clone(),
            proficiency: self.proficiency,
            confidence: self.confidence,
            total_attempts: self.total_attempts,
            correct_attempts: self.correct_attempts,
            last_practiced: self.last_practiced,
            consecutive_correct: self.consecutive_correct,
            consecutive_incorrect: self.consecutive_incorrect,
            average_time_spent: self.average_time_spent,
            difficulty_breakdown: self.difficulty_breakdown,
            trend: self.trend.unwrap_or(previous.trend),
            needs_review: self.needs_review,
            next_review_date: self.next_review_date,
        }
    }

    /// Full record for a topic that had no stored state.
    pub fn into_record(self) -> TopicProficiency {
        TopicProficiency {
            trend: self.trend.unwrap_or_default(),
            topic_id: self.topic_id,
            proficiency: self.proficiency,
            confidence: self.confidence,
            total_attempts: self.total_attempts,
            correct_attempts: self.correct_attempts,
            last_practiced: self.last_practiced,
            consecutive_correct: self.consecutive_correct,
            consecutive_incorrect: self.consecutive_incorrect,
            average_time_spent: self.average_time_spent,
            difficulty_breakdown: self.difficulty_breakdown,
            needs_review: self.needs_review,
            next_review_date: self.next_review_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    LowProficiency,
    DecliningTrend,
    ErrorProne,
    NeedsPractice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyFocus {
    Easy,
    #[serde(rename = "med")]
    Medium,
    Hard,
    Mixed,
}

impl From<Difficulty> for DifficultyFocus {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Easy => Self::Easy,
            Difficulty::Medium => Self::Medium,
            Difficulty::Hard => Self::Hard,
        }
    }
}

/// A topic flagged for remediation. Recomputed on every analysis, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeakArea {
    pub topic_id: String,
    pub proficiency: f64,
    /// 0-100
    pub priority: f64,
    pub reason_code: ReasonCode,
    pub recommended_questions: u32,
    /// Minutes
    pub estimated_study_time: u32,
    pub difficulty_focus: DifficultyFocus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    WeakAreas,
    SpacedReview,
    Maintenance,
    Challenge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedImpact {
    pub proficiency_gain: f64,
    pub weak_areas_addressed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeRecommendation {
    pub id: String,
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    pub topic_ids: Vec<String>,
    pub question_count: u32,
    /// Minutes
    pub estimated_duration: u32,
    pub target_difficulty: DifficultyFocus,
    pub priority: u32,
    pub reasoning: String,
    pub expected_impact: ExpectedImpact,
}

/// Summary of a finished practice session, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSession {
    pub session_id: String,
    pub started_at: i64,
    pub duration_minutes: f64,
    #[serde(default)]
    pub questions_answered: u32,
    #[serde(default)]
    pub accuracy: f64,
}

pub(crate) fn running_mean(mean: f64, count: f64, sample: f64) -> f64 {
    (mean * count + sample) / (count + 1.0)
}
