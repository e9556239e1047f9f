use serde::Serialize;

use crate::services::band_rounding::{round_band, sanitize_score, BandScore};

/// The four IELTS writing criteria as reported by the external grader.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CriterionScores {
    pub task_achievement: f64,
    pub coherence_cohesion: f64,
    pub lexical_resource: f64,
    pub grammatical_range: f64,
}

impl CriterionScores {
    pub fn new(
        task_achievement: f64,
        coherence_cohesion: f64,
        lexical_resource: f64,
        grammatical_range: f64,
    ) -> Self {
        Self { task_achievement, coherence_cohesion, lexical_resource, grammatical_range }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [
            self.task_achievement,
            self.coherence_cohesion,
            self.lexical_resource,
            self.grammatical_range,
        ]
    }

    /// Each criterion snapped onto the half-band scale independently.
    pub fn rounded(&self) -> Self {
        Self {
            task_achievement: round_band(self.task_achievement),
            coherence_cohesion: round_band(self.coherence_cohesion),
            lexical_resource: round_band(self.lexical_resource),
            grammatical_range: round_band(self.grammatical_range),
        }
    }
}

/// Mean of the individually rounded criteria. Rounding happens before
/// averaging; the mean itself is left unrounded. Negative or non-finite
/// criteria count as zero.
pub fn compute_overall(criteria: [f64; 4]) -> f64 {
    let total: f64 = criteria.iter().map(|score| round_band(sanitize_score(*score))).sum();
    total / criteria.len() as f64
}

/// Overall minus penalties, floored at zero, then rounded for display.
pub fn adjusted_score(raw_overall: f64, word_count_penalty: f64, time_penalty: f64) -> BandScore {
    BandScore::round(adjusted_unrounded(raw_overall, word_count_penalty, time_penalty))
}

pub(crate) fn adjusted_unrounded(
    raw_overall: f64,
    word_count_penalty: f64,
    time_penalty: f64,
) -> f64 {
    // Penalties only ever lower the score.
    let adjusted =
        raw_overall - sanitize_score(word_count_penalty) - sanitize_score(time_penalty);
    if adjusted.is_finite() {
        adjusted.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_are_rounded_before_averaging() {
        assert_eq!(compute_overall([6.25, 7.1, 6.8, 7.4]), 7.0);
        // The raw mean here is 6.13, which would round down to 6.0.
        assert_eq!(compute_overall([6.26, 6.26, 6.0, 6.0]), 6.25);
        assert_eq!(round_band(compute_overall([6.26, 6.26, 6.0, 6.0])), 6.5);
    }

    #[test]
    fn overall_of_whole_bands() {
        assert_eq!(compute_overall([7.0, 7.0, 7.0, 7.0]), 7.0);
        assert_eq!(compute_overall([6.0, 6.5, 7.0, 7.5]), 6.75);
    }

    #[test]
    fn non_finite_criterion_counts_as_zero() {
        assert_eq!(compute_overall([f64::NAN, 8.0, 8.0, 8.0]), 6.0);
    }

    #[test]
    fn negative_criterion_counts_as_zero() {
        assert_eq!(compute_overall([-3.0, 7.0, 7.0, 7.0]), 5.25);
        assert_eq!(compute_overall([f64::NEG_INFINITY, -0.5, 7.0, 7.0]), 3.5);
    }

    #[test]
    fn invalid_penalties_never_raise_the_score() {
        assert_eq!(adjusted_score(7.0, -1.0, 0.0).value(), 7.0);
        assert_eq!(adjusted_score(7.0, 0.0, -2.5).value(), 7.0);
        assert_eq!(adjusted_score(7.0, f64::NAN, 0.5).value(), 6.5);
        assert_eq!(adjusted_unrounded(6.75, -1.0, f64::INFINITY), 6.75);
    }

    #[test]
    fn adjusted_score_subtracts_and_rounds() {
        assert_eq!(adjusted_score(7.0, 0.6, 0.0).value(), 6.5);
        assert_eq!(adjusted_score(7.5, 1.0, 0.0).value(), 6.5);
        assert_eq!(adjusted_score(6.75, 0.0, 0.0).value(), 7.0);
    }

    #[test]
    fn adjusted_score_never_negative() {
        assert_eq!(adjusted_score(1.0, 2.0, 1.0).value(), 0.0);
        assert_eq!(adjusted_score(0.0, 2.0, 0.0).value(), 0.0);
        assert_eq!(adjusted_unrounded(1.5, 2.0, 0.0), 0.0);
        assert_eq!(adjusted_unrounded(f64::NAN, 0.0, 0.0), 0.0);
    }

    #[test]
    fn criterion_scores_round_each_field() {
        let raw = CriterionScores::new(6.25, 7.1, 6.8, 7.4);
        assert_eq!(raw.rounded(), CriterionScores::new(6.5, 7.0, 7.0, 7.5));
        assert_eq!(raw.as_array(), [6.25, 7.1, 6.8, 7.4]);
    }
}
