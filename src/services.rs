pub mod band_rounding;
pub mod combination;
pub mod essay_metrics;
pub mod overall;
pub mod penalties;
pub mod scoring_policy;
pub mod submission_scoring;
