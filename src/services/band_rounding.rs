//! IELTS half-band rounding.
//!
//! Scores are split into a whole part and a remainder. The remainder is first
//! rounded to two decimals, then mapped onto `.0`, `.5` or the next whole band:
//!
//! | remainder      | result        |
//! |----------------|---------------|
//! | `.0`, `.5`     | unchanged     |
//! | below `.25`    | `.0`          |
//! | `.25` to `.74` | `.5`          |
//! | `.75` and up   | next band     |

use std::fmt;

use serde::{Serialize, Serializer};

const REMAINDER_EPSILON: f64 = 1e-6;

/// Replaces NaN, infinities and negatives with `0.0`.
pub fn sanitize_score(score: f64) -> f64 {
    if score.is_finite() && score > 0.0 {
        score
    } else {
        0.0
    }
}

pub fn round_band(score: f64) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }

    let whole = score.floor();
    let remainder = ((score - whole) * 100.0).round() / 100.0;

    let rounded = if near(remainder, 0.0) || near(remainder, 0.5) {
        whole + remainder
    } else if remainder < 0.25 - REMAINDER_EPSILON {
        whole
    } else if remainder < 0.75 - REMAINDER_EPSILON {
        whole + 0.5
    } else {
        whole + 1.0
    };

    // Snap off any residue left by `whole + remainder` and normalize -0.0.
    (rounded * 2.0).round() / 2.0 + 0.0
}

/// `7` for whole bands, `7.5` for half bands.
pub fn format_band(score: f64) -> String {
    let rounded = round_band(score);
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

fn near(value: f64, target: f64) -> bool {
    (value - target).abs() < REMAINDER_EPSILON
}

/// A score snapped onto the half-band scale.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct BandScore(f64);

impl BandScore {
    pub fn round(score: f64) -> Self {
        Self(round_band(score))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn tier(self) -> BandTier {
        BandTier::of(self.0)
    }
}

impl fmt::Display for BandScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_band(self.0))
    }
}

impl Serialize for BandScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

impl From<BandScore> for f64 {
    fn from(band: BandScore) -> Self {
        band.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandTier {
    High,
    Good,
    Competent,
    Limited,
}

impl BandTier {
    pub fn of(score: f64) -> Self {
        let band = round_band(score);
        if band >= 7.5 {
            BandTier::High
        } else if band >= 6.5 {
            BandTier::Good
        } else if band >= 5.5 {
            BandTier::Competent
        } else {
            BandTier::Limited
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_half_band(value: f64) -> bool {
        ((value * 2.0) - (value * 2.0).round()).abs() < 1e-9
    }

    #[test]
    fn published_rounding_cases() {
        let cases = [
            (7.25, 7.5),
            (7.2, 7.0),
            (7.3, 7.5),
            (7.75, 8.0),
            (7.8, 8.0),
            (7.0, 7.0),
            (7.5, 7.5),
            (6.1, 6.0),
            (6.15, 6.0),
            (6.35, 6.5),
            (6.4, 6.5),
            (6.45, 6.5),
            (6.55, 6.5),
            (6.6, 6.5),
            (6.65, 6.5),
            (6.7, 6.5),
            (6.85, 7.0),
            (6.9, 7.0),
            (6.95, 7.0),
        ];
        for (input, expected) in cases {
            assert_eq!(round_band(input), expected, "round_band({input})");
        }
    }

    #[test]
    fn floating_noise_does_not_change_the_band() {
        assert_eq!(round_band(7.249_999_999), 7.5);
        assert_eq!(round_band(0.1 + 0.2 + 6.0), 6.5);
        assert_eq!(round_band(6.999_999), 7.0);
        assert_eq!(round_band(8.749_999_9), 9.0);
    }

    #[test]
    fn non_finite_falls_back_to_zero() {
        assert_eq!(round_band(f64::NAN), 0.0);
        assert_eq!(round_band(f64::INFINITY), 0.0);
        assert_eq!(round_band(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn negative_inputs_are_not_clamped() {
        assert_eq!(round_band(-0.3), -0.5);
        assert_eq!(round_band(-1.0), -1.0);
        assert_eq!(round_band(-0.1), 0.0);
        assert!(round_band(-0.1).is_sign_positive());
    }

    #[test]
    fn idempotent_and_on_scale_across_range() {
        let mut x = 0.0;
        while x <= 9.0 {
            let once = round_band(x);
            assert!(is_half_band(once), "round_band({x}) = {once}");
            assert!(once >= 0.0);
            assert!((once - x).abs() <= 0.5 + 1e-9);
            assert_eq!(round_band(once), once);
            x += 0.01;
        }
    }

    #[test]
    fn format_band_whole_and_half() {
        assert_eq!(format_band(7.0), "7");
        assert_eq!(format_band(7.5), "7.5");
        assert_eq!(format_band(6.8), "7");
        assert_eq!(format_band(0.6), "0.5");
        assert_eq!(format_band(f64::NAN), "0");
        assert_eq!(format_band(-0.1), "0");
    }

    #[test]
    fn sanitize_score_neutralizes_bad_values() {
        assert_eq!(sanitize_score(6.5), 6.5);
        assert_eq!(sanitize_score(-2.0), 0.0);
        assert_eq!(sanitize_score(f64::NAN), 0.0);
        assert_eq!(sanitize_score(f64::INFINITY), 0.0);
    }

    #[test]
    fn band_score_display_and_serialize() {
        let band = BandScore::round(6.25);
        assert_eq!(band.value(), 6.5);
        assert_eq!(band.to_string(), "6.5");
        assert_eq!(serde_json::to_string(&band).unwrap(), "6.5");
        assert_eq!(serde_json::to_string(&BandScore::round(7.1)).unwrap(), "7.0");
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(BandTier::of(8.0), BandTier::High);
        assert_eq!(BandTier::of(7.5), BandTier::High);
        assert_eq!(BandTier::of(7.0), BandTier::Good);
        assert_eq!(BandTier::of(6.5), BandTier::Good);
        assert_eq!(BandTier::of(5.5), BandTier::Competent);
        assert_eq!(BandTier::of(5.0), BandTier::Limited);
        assert_eq!(BandTier::of(f64::NAN), BandTier::Limited);
    }
}
