//! Turning raw class scores into a labelled prediction.

use std::fmt;

use crate::error::{Error, Result};

/// Number of digit classes.
pub const NUM_CLASSES: usize = 10;

/// Tolerance for treating scores as an already normalized distribution.
const DISTRIBUTION_EPSILON: f32 = 1e-3;

/// How confidence values are presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfidenceScale {
    /// Raw probability in [0, 1].
    #[default]
    Probability,
    /// Percentage in [0, 100].
    Percentage,
}

/// Coarse confidence bucket for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(label)
    }
}

/// The classifier's verdict for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    digit: u8,
    confidence: f32,
    probabilities: [f32; NUM_CLASSES],
}

impl Prediction {
    /// Build a prediction from per-class scores.
    ///
    /// Scores that already form a probability distribution are used as-is;
    /// anything else (raw logits) goes through a softmax first. The label is
    /// the index of the highest probability, the lowest index winning ties.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOutput`] if there are not exactly ten scores or
    /// any score is not finite.
    pub fn from_scores(scores: &[f32]) -> Result<Self> {
        if scores.len() != NUM_CLASSES {
            return Err(Error::InvalidOutput {
                reason: format!("expected {NUM_CLASSES} class scores, got {}", scores.len()),
            });
        }

        if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
            return Err(Error::InvalidOutput {
                reason: format!("non-finite class score {bad}"),
            });
        }

        let mut probabilities = [0.0; NUM_CLASSES];
        probabilities.copy_from_slice(scores);
        if !is_distribution(&probabilities) {
            softmax(&mut probabilities);
        }

        let (index, confidence) = probabilities.iter().copied().enumerate().fold(
            (0, f32::NEG_INFINITY),
            |best, (i, p)| if p > best.1 { (i, p) } else { best },
        );

        #[allow(clippy::cast_possible_truncation)]
        let digit = index as u8; // Safe: index < NUM_CLASSES

        Ok(Self {
            digit,
            confidence: confidence.clamp(0.0, 1.0),
            probabilities,
        })
    }

    /// The predicted digit, 0 through 9.
    #[must_use]
    pub const fn digit(&self) -> u8 {
        self.digit
    }

    /// Probability of the predicted digit, in [0, 1].
    #[must_use]
    pub const fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Confidence expressed on the requested scale.
    #[must_use]
    pub fn confidence_on(&self, scale: ConfidenceScale) -> f32 {
        match scale {
            ConfidenceScale::Probability => self.confidence,
            ConfidenceScale::Percentage => self.confidence * 100.0,
        }
    }

    /// Probability of every class, indexed by digit.
    #[must_use]
    pub const fn probabilities(&self) -> &[f32; NUM_CLASSES] {
        &self.probabilities
    }

    /// Bucket the confidence using `high` and `medium` thresholds.
    #[must_use]
    pub fn level(&self, high: f32, medium: f32) -> ConfidenceLevel {
        if self.confidence >= high {
            ConfidenceLevel::High
        } else if self.confidence >= medium {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

fn is_distribution(values: &[f32]) -> bool {
    values.iter().all(|v| (0.0..=1.0).contains(v))
        && (values.iter().sum::<f32>() - 1.0).abs() < DISTRIBUTION_EPSILON
}

fn softmax(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
}
