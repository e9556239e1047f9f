use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::time::format_offset;
use crate::services::band_rounding::{format_band, BandScore, BandTier};
use crate::services::combination::CombinedScore;
use crate::services::essay_metrics::format_time_spent;
use crate::services::penalties::WordCountStatus;
use crate::services::scoring_policy::{ScoringPolicy, TaskType};
use crate::services::submission_scoring::Submission;

/// One graded attempt as handed over by the grading backend. Numeric fields
/// accept numbers, numeric strings or null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub exercise_id: Option<String>,
    #[serde(default)]
    pub essay_text: Option<String>,
    #[serde(default)]
    pub word_count: Option<Value>,
    #[serde(default, alias = "time_spent")]
    pub time_spent_seconds: Option<Value>,
    #[serde(default)]
    pub task_achievement: Option<Value>,
    #[serde(default)]
    pub coherence_cohesion: Option<Value>,
    #[serde(default)]
    pub lexical_resource: Option<Value>,
    #[serde(default)]
    pub grammatical_range: Option<Value>,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(raw)) => Some(raw.trim().to_string()).filter(|raw| !raw.is_empty()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub task_type: TaskType,
    pub word_count: u32,
    pub time_spent_seconds: u32,
    pub time_spent_display: String,
    pub time_limit_minutes: u32,
    pub over_time_limit: bool,
    pub submitted_at: Option<String>,
    pub task_achievement: BandScore,
    pub coherence_cohesion: BandScore,
    pub lexical_resource: BandScore,
    pub grammatical_range: BandScore,
    pub raw_overall_score: f64,
    pub overall_score: BandScore,
    pub overall_score_display: String,
    pub word_count_penalty: f64,
    pub word_count_penalty_display: String,
    pub time_penalty: f64,
    pub time_penalty_display: String,
    pub adjusted_score: BandScore,
    pub adjusted_score_display: String,
    /// `"7.5 → 6.5"` when a penalty lowered the score.
    pub score_change_display: Option<String>,
    pub band_tier: BandTier,
    pub word_count_status: WordCountStatus,
    pub word_count_message: Option<String>,
}

impl SubmissionResponse {
    pub fn from_submission(submission: &Submission, policy: &ScoringPolicy) -> Self {
        let task = submission.task_type();
        let criteria = submission.criteria();
        let overall = submission.overall_band();
        let adjusted = submission.adjusted_score();
        let word_count_status = WordCountStatus::evaluate(submission.word_count(), task, policy);

        let time_spent = Some(submission.time_spent_seconds()).filter(|seconds| *seconds > 0);

        Self {
            id: submission.id().map(str::to_string),
            user_id: submission.user_id().map(str::to_string),
            task_type: task,
            word_count: submission.word_count(),
            time_spent_seconds: submission.time_spent_seconds(),
            time_spent_display: format_time_spent(time_spent),
            time_limit_minutes: policy.time_limit_minutes(task),
            over_time_limit: submission.is_over_time_limit(),
            submitted_at: submission.submitted_at().map(format_offset),
            task_achievement: BandScore::round(criteria.task_achievement),
            coherence_cohesion: BandScore::round(criteria.coherence_cohesion),
            lexical_resource: BandScore::round(criteria.lexical_resource),
            grammatical_range: BandScore::round(criteria.grammatical_range),
            raw_overall_score: submission.raw_overall(),
            overall_score: overall,
            overall_score_display: overall.to_string(),
            word_count_penalty: submission.word_count_penalty().amount,
            word_count_penalty_display: format_band(submission.word_count_penalty().amount),
            time_penalty: submission.time_penalty().amount,
            time_penalty_display: format_band(submission.time_penalty().amount),
            adjusted_score: adjusted,
            adjusted_score_display: adjusted.to_string(),
            score_change_display: submission
                .has_penalties()
                .then(|| format!("{overall} → {adjusted}")),
            band_tier: adjusted.tier(),
            word_count_message: word_count_status.message(),
            word_count_status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CombinedScoreResponse {
    pub user_id: Option<String>,
    pub task1_submission_id: Option<String>,
    pub task2_submission_id: Option<String>,
    pub task1_score: BandScore,
    pub task2_score: BandScore,
    pub combined_score: BandScore,
    pub combined_score_display: String,
}

impl From<&CombinedScore> for CombinedScoreResponse {
    fn from(combined: &CombinedScore) -> Self {
        Self {
            user_id: combined.user_id().map(str::to_string),
            task1_submission_id: combined.task1_submission_id().map(str::to_string),
            task2_submission_id: combined.task2_submission_id().map(str::to_string),
            task1_score: combined.task1_score(),
            task2_score: combined.task2_score(),
            combined_score: combined.score(),
            combined_score_display: combined.score().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub submissions: Vec<SubmissionRequest>,
}

#[derive(Debug, Serialize)]
pub struct RejectedSubmission {
    pub index: usize,
    pub id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub scores: Vec<SubmissionResponse>,
    pub combined_scores: Vec<CombinedScoreResponse>,
    pub rejected: Vec<RejectedSubmission>,
}
