//! IELTS writing band scoring: half-band rounding, word-count and time
//! penalties, and the weighted Task 1 / Task 2 combined band.

pub mod core;
pub mod schemas;
pub mod services;

use std::io::Read;
use std::{env, fs};

use anyhow::{anyhow, Context, Result};

use crate::core::{config::Settings, telemetry};
use crate::schemas::submission::{
    BatchRequest, BatchResponse, CombinedScoreResponse, RejectedSubmission, SubmissionResponse,
};
use crate::services::combination::latest_combined;
use crate::services::submission_scoring::score_submission;

pub use crate::services::band_rounding::{format_band, round_band, BandScore, BandTier};
pub use crate::services::combination::{combine, CombinedScore};
pub use crate::services::overall::{adjusted_score, compute_overall, CriterionScores};
pub use crate::services::penalties::{
    is_over_time_limit, time_penalty, word_count_penalty, Penalty, PenaltyReason, WordCountStatus,
};
pub use crate::services::scoring_policy::{
    NoTimePenalty, PerMinuteOverrun, ScoringPolicy, TaskType, TimePenaltyRule,
};
pub use crate::services::submission_scoring::{ScoringError, Submission, SubmissionInput};

/// Scores every record, then combines each user's latest Task 1 and Task 2.
/// Records that cannot be interpreted are reported, not fatal.
pub fn score_batch(request: &BatchRequest, policy: &ScoringPolicy) -> BatchResponse {
    let mut submissions = Vec::with_capacity(request.submissions.len());
    let mut rejected = Vec::new();

    for (index, record) in request.submissions.iter().enumerate() {
        match score_submission(record, policy) {
            Ok(submission) => submissions.push(submission),
            Err(err) => {
                tracing::warn!(
                    index,
                    id = record.id.as_deref().unwrap_or("-"),
                    error = %err,
                    "Rejected submission"
                );
                rejected.push(RejectedSubmission {
                    index,
                    id: record.id.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    let combined = latest_combined(&submissions);

    BatchResponse {
        scores: submissions
            .iter()
            .map(|submission| SubmissionResponse::from_submission(submission, policy))
            .collect(),
        combined_scores: combined.iter().map(CombinedScoreResponse::from).collect(),
        rejected,
    }
}

pub fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;

    let input_path = parse_args()?;
    let payload = read_input(&input_path)?;
    let request: BatchRequest = serde_json::from_str(&payload)
        .with_context(|| format!("Invalid JSON in {input_path}"))?;

    let policy = settings.scoring_policy();
    let response = score_batch(&request, &policy);

    tracing::info!(
        environment = %settings.runtime().environment.as_str(),
        scored = response.scores.len(),
        combined = response.combined_scores.len(),
        rejected = response.rejected.len(),
        "Scored batch"
    );

    let output = serde_json::to_string_pretty(&response).context("Failed to encode scores")?;
    println!("{output}");

    Ok(())
}

fn parse_args() -> Result<String> {
    let mut args = env::args().skip(1);
    let input_path = args.next().ok_or_else(|| anyhow!("usage: ielts-scoring <input.json | ->"))?;
    if let Some(extra) = args.next() {
        return Err(anyhow!("Unknown argument: {extra}"));
    }
    Ok(input_path)
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut payload = String::new();
        std::io::stdin().read_to_string(&mut payload).context("Failed to read stdin")?;
        return Ok(payload);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
}
