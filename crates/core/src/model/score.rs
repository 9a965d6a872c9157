use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("scaled score must be a finite value in [-1, 1], got {0}")]
    ScaledOutOfRange(f64),

    #[error("score minimum ({min}) exceeds maximum ({max})")]
    InvalidRange { min: f64, max: f64 },

    #[error("raw score {raw} is outside [{min}, {max}]")]
    RawOutOfRange { raw: f64, min: f64, max: f64 },
}

/// Learner score attached to pass/fail results.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Score {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scaled: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    raw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
}

impl Score {
    /// Build a score from a scaled value only.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::ScaledOutOfRange` if `scaled` is not finite or outside [-1, 1].
    pub fn scaled(scaled: f64) -> Result<Self, ScoreError> {
        if !scaled.is_finite() || !(-1.0..=1.0).contains(&scaled) {
            return Err(ScoreError::ScaledOutOfRange(scaled));
        }
        Ok(Self {
            scaled: Some(scaled),
            ..Self::default()
        })
    }

    /// Build a score from raw points within `[min, max]`.
    ///
    /// The scaled value is derived as `(raw - min) / (max - min)` and left
    /// unset when the range is empty.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::InvalidRange` if `min > max` (or either is not finite),
    /// and `ScoreError::RawOutOfRange` if `raw` falls outside the range.
    pub fn from_raw(raw: f64, min: f64, max: f64) -> Result<Self, ScoreError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ScoreError::InvalidRange { min, max });
        }
        if !raw.is_finite() || raw < min || raw > max {
            return Err(ScoreError::RawOutOfRange { raw, min, max });
        }
        let scaled = (max > min).then(|| (raw - min) / (max - min));
        Ok(Self {
            scaled,
            raw: Some(raw),
            min: Some(min),
            max: Some(max),
        })
    }

    #[must_use]
    pub fn scaled_value(&self) -> Option<f64> {
        self.scaled
    }

    #[must_use]
    pub fn raw(&self) -> Option<f64> {
        self.raw
    }

    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// True if the scaled score meets `threshold`. Unscaled scores never pass.
    #[must_use]
    pub fn meets(&self, threshold: f64) -> bool {
        self.scaled.is_some_and(|scaled| scaled >= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_rejects_out_of_range() {
        assert!(Score::scaled(0.75).is_ok());
        assert_eq!(
            Score::scaled(1.5),
            Err(ScoreError::ScaledOutOfRange(1.5))
        );
        assert!(Score::scaled(f64::NAN).is_err());
    }

    #[test]
    fn raw_score_derives_scaled() {
        let score = Score::from_raw(8.0, 0.0, 10.0).unwrap();
        assert_eq!(score.scaled_value(), Some(0.8));
        assert!(score.meets(0.8));
        assert!(!score.meets(0.9));
    }

    #[test]
    fn raw_score_validates_bounds() {
        assert!(matches!(
            Score::from_raw(1.0, 5.0, 2.0),
            Err(ScoreError::InvalidRange { .. })
        ));
        assert!(matches!(
            Score::from_raw(11.0, 0.0, 10.0),
            Err(ScoreError::RawOutOfRange { .. })
        ));
        let flat = Score::from_raw(3.0, 3.0, 3.0).unwrap();
        assert_eq!(flat.scaled_value(), None);
    }

    #[test]
    fn serializes_only_present_fields() {
        let value = serde_json::to_value(Score::scaled(0.5).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({ "scaled": 0.5 }));
    }
}
