use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

use crate::core::time::parse_rfc3339;
use crate::schemas::submission::SubmissionRequest;
use crate::services::band_rounding::{sanitize_score, BandScore};
use crate::services::essay_metrics::count_words;
use crate::services::overall::{adjusted_unrounded, compute_overall, CriterionScores};
use crate::services::penalties::Penalty;
use crate::services::scoring_policy::{ScoringPolicy, TaskType};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoringError {
    #[error("unknown task type: {0}")]
    UnknownTaskType(String),
    #[error("task type is missing and no exercise id was given")]
    MissingTaskType,
}

/// Metadata and raw grader output for one essay, already sanitized.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionInput {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub task_type: TaskType,
    pub word_count: u32,
    pub time_spent_seconds: u32,
    pub criteria: CriterionScores,
    pub submitted_at: Option<OffsetDateTime>,
}

impl SubmissionInput {
    pub fn new(
        task_type: TaskType,
        word_count: u32,
        time_spent_seconds: u32,
        criteria: CriterionScores,
    ) -> Self {
        Self {
            id: None,
            user_id: None,
            task_type,
            word_count,
            time_spent_seconds,
            criteria,
            submitted_at: None,
        }
    }

    pub fn with_identity(mut self, id: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_submitted_at(mut self, submitted_at: OffsetDateTime) -> Self {
        self.submitted_at = Some(submitted_at);
        self
    }
}

/// One graded attempt. Built once by [`Submission::score`] and never mutated;
/// a resubmission is a new `Submission`.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    id: Option<String>,
    user_id: Option<String>,
    task_type: TaskType,
    word_count: u32,
    time_spent_seconds: u32,
    submitted_at: Option<OffsetDateTime>,
    raw_criteria: CriterionScores,
    criteria: CriterionScores,
    raw_overall: f64,
    word_count_penalty: Penalty,
    time_penalty: Penalty,
    over_time_limit: bool,
    adjusted_raw: f64,
    adjusted: BandScore,
}

impl Submission {
    pub fn score(input: SubmissionInput, policy: &ScoringPolicy) -> Self {
        let raw_criteria = CriterionScores::new(
            sanitize_score(input.criteria.task_achievement),
            sanitize_score(input.criteria.coherence_cohesion),
            sanitize_score(input.criteria.lexical_resource),
            sanitize_score(input.criteria.grammatical_range),
        );
        let criteria = raw_criteria.rounded();
        let raw_overall = compute_overall(raw_criteria.as_array());

        let word_count_penalty = Penalty::word_count(input.word_count, input.task_type, policy);
        let time_penalty = Penalty::time(input.time_spent_seconds, input.task_type, policy);
        let over_time_limit = policy.is_over_time_limit(input.time_spent_seconds, input.task_type);

        let adjusted_raw =
            adjusted_unrounded(raw_overall, word_count_penalty.amount, time_penalty.amount);
        let adjusted = BandScore::round(adjusted_raw);

        tracing::debug!(
            submission_id = input.id.as_deref().unwrap_or("-"),
            task_type = %input.task_type,
            raw_overall,
            word_count_penalty = word_count_penalty.amount,
            time_penalty = time_penalty.amount,
            adjusted = adjusted.value(),
            "Scored submission"
        );

        Self {
            id: input.id,
            user_id: input.user_id,
            task_type: input.task_type,
            word_count: input.word_count,
            time_spent_seconds: input.time_spent_seconds,
            submitted_at: input.submitted_at,
            raw_criteria,
            criteria,
            raw_overall,
            word_count_penalty,
            time_penalty,
            over_time_limit,
            adjusted_raw,
            adjusted,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn word_count(&self) -> u32 {
        self.word_count
    }

    pub fn time_spent_seconds(&self) -> u32 {
        self.time_spent_seconds
    }

    pub fn submitted_at(&self) -> Option<OffsetDateTime> {
        self.submitted_at
    }

    pub fn raw_criteria(&self) -> &CriterionScores {
        &self.raw_criteria
    }

    /// Criteria after half-band rounding.
    pub fn criteria(&self) -> &CriterionScores {
        &self.criteria
    }

    /// Mean of the rounded criteria, before penalties and before display rounding.
    pub fn raw_overall(&self) -> f64 {
        self.raw_overall
    }

    pub fn overall_band(&self) -> BandScore {
        BandScore::round(self.raw_overall)
    }

    pub fn word_count_penalty(&self) -> Penalty {
        self.word_count_penalty
    }

    pub fn time_penalty(&self) -> Penalty {
        self.time_penalty
    }

    pub fn has_penalties(&self) -> bool {
        self.word_count_penalty.applies() || self.time_penalty.applies()
    }

    pub fn is_over_time_limit(&self) -> bool {
        self.over_time_limit
    }

    /// Overall minus penalties, floored at zero but not yet rounded.
    pub fn adjusted_raw(&self) -> f64 {
        self.adjusted_raw
    }

    pub fn adjusted_score(&self) -> BandScore {
        self.adjusted
    }
}

/// Interprets a boundary record and scores it.
pub fn score_submission(
    request: &SubmissionRequest,
    policy: &ScoringPolicy,
) -> Result<Submission, ScoringError> {
    let input = submission_input(request)?;
    Ok(Submission::score(input, policy))
}

pub fn submission_input(request: &SubmissionRequest) -> Result<SubmissionInput, ScoringError> {
    let task_type = resolve_task_type(request)?;

    let word_count = match request.word_count.as_ref().and_then(lenient_f64) {
        Some(count) => count_from_f64(count),
        None => request.essay_text.as_deref().map(count_words).unwrap_or(0),
    };
    let time_spent_seconds =
        request.time_spent_seconds.as_ref().and_then(lenient_f64).map(count_from_f64).unwrap_or(0);

    let criteria = CriterionScores::new(
        criterion(&request.task_achievement, "task_achievement", request),
        criterion(&request.coherence_cohesion, "coherence_cohesion", request),
        criterion(&request.lexical_resource, "lexical_resource", request),
        criterion(&request.grammatical_range, "grammatical_range", request),
    );

    let submitted_at = match request.submitted_at.as_deref() {
        Some(raw) => {
            let parsed = parse_rfc3339(raw);
            if parsed.is_none() {
                tracing::warn!(
                    submission_id = request.id.as_deref().unwrap_or("-"),
                    value = raw,
                    "Ignoring unparseable submitted_at"
                );
            }
            parsed
        }
        None => None,
    };

    Ok(SubmissionInput {
        id: request.id.clone(),
        user_id: request.user_id.clone(),
        task_type,
        word_count,
        time_spent_seconds,
        criteria,
        submitted_at,
    })
}

fn resolve_task_type(request: &SubmissionRequest) -> Result<TaskType, ScoringError> {
    if let Some(raw) = request.task_type.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        return TaskType::parse(raw).ok_or_else(|| ScoringError::UnknownTaskType(raw.to_string()));
    }

    request
        .exercise_id
        .as_deref()
        .map(TaskType::from_exercise_id)
        .ok_or(ScoringError::MissingTaskType)
}

fn criterion(value: &Option<Value>, name: &'static str, request: &SubmissionRequest) -> f64 {
    let raw = value.as_ref().and_then(lenient_f64);
    let sanitized = raw.map(sanitize_score).unwrap_or(0.0);
    if raw != Some(sanitized) {
        tracing::warn!(
            submission_id = request.id.as_deref().unwrap_or("-"),
            criterion = name,
            "Criterion score missing or invalid; using 0.0"
        );
    }
    sanitized
}

/// Numbers and numeric strings; everything else is unreadable.
pub(crate) fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn count_from_f64(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    if value >= f64::from(u32::MAX) {
        return u32::MAX;
    }
    value.floor() as u32
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request(value: Value) -> SubmissionRequest {
        serde_json::from_value(value).expect("valid request shape")
    }

    #[test]
    fn end_to_end_task1_short_essay() {
        let policy = ScoringPolicy::default();
        let input = SubmissionInput::new(
            TaskType::Task1,
            120,
            900,
            CriterionScores::new(6.25, 7.1, 6.8, 7.4),
        );
        let submission = Submission::score(input, &policy);

        assert_eq!(submission.criteria(), &CriterionScores::new(6.5, 7.0, 7.0, 7.5));
        assert_eq!(submission.raw_overall(), 7.0);
        assert!((submission.word_count_penalty().amount - 0.6).abs() < 1e-9);
        assert_eq!(submission.time_penalty().amount, 0.0);
        assert!((submission.adjusted_raw() - 6.4).abs() < 1e-9);
        assert_eq!(submission.adjusted_score().value(), 6.5);
        assert!(submission.has_penalties());
        assert!(!submission.is_over_time_limit());
    }

    #[test]
    fn raw_values_are_retained_next_to_adjusted() {
        let policy = ScoringPolicy::default();
        let input =
            SubmissionInput::new(TaskType::Task2, 200, 0, CriterionScores::new(7.5, 7.5, 7.5, 7.5));
        let submission = Submission::score(input, &policy);

        assert_eq!(submission.overall_band().value(), 7.5);
        assert_eq!(submission.word_count_penalty().amount, 1.0);
        assert_eq!(submission.adjusted_score().value(), 6.5);
    }

    #[test]
    fn time_overrun_adds_penalty() {
        let policy = ScoringPolicy::default();
        let input = SubmissionInput::new(
            TaskType::Task2,
            300,
            2400 + 600,
            CriterionScores::new(7.0, 7.0, 7.0, 7.0),
        );
        let submission = Submission::score(input, &policy);

        assert!(submission.is_over_time_limit());
        assert!((submission.time_penalty().amount - 1.0).abs() < 1e-9);
        assert_eq!(submission.adjusted_score().value(), 6.0);
    }

    #[test]
    fn heavy_penalties_floor_at_zero() {
        let policy = ScoringPolicy::default();
        let input = SubmissionInput::new(
            TaskType::Task2,
            0,
            100_000,
            CriterionScores::new(2.0, 2.0, 2.0, 2.0),
        );
        let submission = Submission::score(input, &policy);
        assert_eq!(submission.adjusted_score().value(), 0.0);
    }

    #[test]
    fn invalid_criteria_become_zero() {
        let policy = ScoringPolicy::default();
        let input = SubmissionInput::new(
            TaskType::Task1,
            200,
            0,
            CriterionScores::new(f64::NAN, -3.0, 8.0, 8.0),
        );
        let submission = Submission::score(input, &policy);
        assert_eq!(submission.raw_criteria(), &CriterionScores::new(0.0, 0.0, 8.0, 8.0));
        assert_eq!(submission.raw_overall(), 4.0);
    }

    #[test]
    fn request_with_explicit_fields() {
        let policy = ScoringPolicy::default();
        let submission = score_submission(
            &request(json!({
                "id": "w-1",
                "user_id": 42,
                "task_type": "task2",
                "word_count": 260,
                "time_spent": "1800",
                "task_achievement": 7,
                "coherence_cohesion": "6.5",
                "lexical_resource": 6.8,
                "grammatical_range": 7.25,
                "submitted_at": "2025-03-01T09:30:00Z"
            })),
            &policy,
        )
        .expect("scored");

        assert_eq!(submission.id(), Some("w-1"));
        assert_eq!(submission.user_id(), Some("42"));
        assert_eq!(submission.task_type(), TaskType::Task2);
        assert_eq!(submission.word_count(), 260);
        assert_eq!(submission.time_spent_seconds(), 1800);
        assert_eq!(submission.criteria(), &CriterionScores::new(7.0, 6.5, 7.0, 7.5));
        assert_eq!(submission.adjusted_score().value(), 7.0);
        assert!(submission.submitted_at().is_some());
    }

    #[test]
    fn word_count_falls_back_to_essay_text() {
        let input = submission_input(&request(json!({
            "task_type": "task1",
            "essay_text": "The graph illustrates changes in rainfall."
        })))
        .expect("input");
        assert_eq!(input.word_count, 6);
        assert_eq!(input.time_spent_seconds, 0);
    }

    #[test]
    fn malformed_numbers_fall_back_to_neutral_values() {
        let input = submission_input(&request(json!({
            "task_type": "task1",
            "word_count": -12,
            "time_spent": null,
            "task_achievement": "n/a",
            "coherence_cohesion": null,
            "lexical_resource": [],
            "submitted_at": "last tuesday"
        })))
        .expect("input");
        assert_eq!(input.word_count, 0);
        assert_eq!(input.time_spent_seconds, 0);
        assert_eq!(input.criteria, CriterionScores::default());
        assert_eq!(input.submitted_at, None);
    }

    #[test]
    fn task_type_from_exercise_id_when_absent() {
        let input = submission_input(&request(json!({ "exercise_id": "vstep_task1_email" })))
            .expect("input");
        assert_eq!(input.task_type, TaskType::Task1);
    }

    #[test]
    fn task_type_errors() {
        assert_eq!(
            submission_input(&request(json!({ "task_type": "task3" }))).unwrap_err(),
            ScoringError::UnknownTaskType("task3".to_string())
        );
        assert_eq!(
            submission_input(&request(json!({}))).unwrap_err(),
            ScoringError::MissingTaskType
        );
    }

    #[test]
    fn fractional_counts_are_truncated() {
        assert_eq!(count_from_f64(149.9), 149);
        assert_eq!(count_from_f64(f64::NAN), 0);
        assert_eq!(count_from_f64(1e12), u32::MAX);
    }
}
