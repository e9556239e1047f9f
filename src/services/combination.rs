use std::collections::BTreeMap;

use crate::services::band_rounding::{sanitize_score, BandScore};
use crate::services::scoring_policy::{TaskType, TASK1_WEIGHT, TASK2_WEIGHT};
use crate::services::submission_scoring::Submission;

/// Weighted Task 1 / Task 2 band. `None` until both tasks have a score.
pub fn combine(task1_adjusted: Option<f64>, task2_adjusted: Option<f64>) -> Option<BandScore> {
    let (task1, task2) = (task1_adjusted?, task2_adjusted?);
    let weighted = sanitize_score(task1) * TASK1_WEIGHT + sanitize_score(task2) * TASK2_WEIGHT;
    Some(BandScore::round(weighted))
}

/// A view over one Task 1 and one Task 2 submission; recomputed, never stored
/// on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedScore {
    user_id: Option<String>,
    task1_submission_id: Option<String>,
    task2_submission_id: Option<String>,
    task1_score: BandScore,
    task2_score: BandScore,
    score: BandScore,
}

impl CombinedScore {
    pub fn from_pair(task1: Option<&Submission>, task2: Option<&Submission>) -> Option<Self> {
        let (task1, task2) = (task1?, task2?);

        if task1.task_type() != TaskType::Task1 || task2.task_type() != TaskType::Task2 {
            tracing::warn!(
                task1_slot = %task1.task_type(),
                task2_slot = %task2.task_type(),
                "Refusing to combine submissions with mismatched task types"
            );
            return None;
        }

        // Two anonymous submissions are a caller-asserted pair; a known user
        // never pairs with an unknown one.
        if task1.user_id() != task2.user_id() {
            tracing::warn!(
                task1_user = task1.user_id().unwrap_or("<none>"),
                task2_user = task2.user_id().unwrap_or("<none>"),
                "Refusing to combine submissions from different users"
            );
            return None;
        }

        let score = combine(
            Some(task1.adjusted_score().value()),
            Some(task2.adjusted_score().value()),
        )?;

        Some(Self {
            user_id: task1.user_id().map(str::to_string),
            task1_submission_id: task1.id().map(str::to_string),
            task2_submission_id: task2.id().map(str::to_string),
            task1_score: task1.adjusted_score(),
            task2_score: task2.adjusted_score(),
            score,
        })
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn task1_submission_id(&self) -> Option<&str> {
        self.task1_submission_id.as_deref()
    }

    pub fn task2_submission_id(&self) -> Option<&str> {
        self.task2_submission_id.as_deref()
    }

    pub fn task1_score(&self) -> BandScore {
        self.task1_score
    }

    pub fn task2_score(&self) -> BandScore {
        self.task2_score
    }

    pub fn score(&self) -> BandScore {
        self.score
    }
}

#[derive(Default)]
struct LatestPair<'a> {
    task1: Option<&'a Submission>,
    task2: Option<&'a Submission>,
}

impl<'a> LatestPair<'a> {
    fn offer(&mut self, submission: &'a Submission) {
        let slot = match submission.task_type() {
            TaskType::Task1 => &mut self.task1,
            TaskType::Task2 => &mut self.task2,
        };
        let replace = match *slot {
            Some(current) => is_at_least_as_recent(submission, current),
            None => true,
        };
        if replace {
            *slot = Some(submission);
        }
    }
}

// Later history entries win unless both timestamps say otherwise.
fn is_at_least_as_recent(candidate: &Submission, current: &Submission) -> bool {
    match (candidate.submitted_at(), current.submitted_at()) {
        (Some(candidate_at), Some(current_at)) => candidate_at >= current_at,
        _ => true,
    }
}

/// Combines each user's most recent Task 1 and Task 2 submission. Users with
/// only one task yield nothing, and submissions without a user id are never
/// grouped. Results are ordered by user id.
pub fn latest_combined(history: &[Submission]) -> Vec<CombinedScore> {
    let mut by_user: BTreeMap<&str, LatestPair<'_>> = BTreeMap::new();
    for submission in history {
        match submission.user_id() {
            Some(user_id) => by_user.entry(user_id).or_default().offer(submission),
            None => tracing::debug!(
                submission_id = submission.id().unwrap_or("<none>"),
                "Skipping submission without user id for combination"
            ),
        }
    }

    by_user
        .into_values()
        .filter_map(|pair| CombinedScore::from_pair(pair.task1, pair.task2))
        .collect()
}
