//! End-to-end digit recognition: normalize, classify, record.

use std::path::{Path, PathBuf};

use ::image::GrayImage;

use crate::error::{Error, Result};
use crate::image::{self, DigitTensor, RawImage};
use crate::model::{
    ConfidenceLevel, ConfidenceScale, Model, ModelHandle, ModelLocator, OnnxModel, Prediction,
};

use super::history::{InputKind, PredictionHistory};

/// Configuration for the recognizer.
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit model artifact. `None` searches the well-known locations.
    pub model_path: Option<PathBuf>,

    /// Scale used when presenting confidence values.
    pub confidence_scale: ConfidenceScale,

    /// Confidence at or above this is reported as high (0.0-1.0).
    pub confidence_threshold: f32,

    /// Confidence below this is reported as low (0.0-1.0).
    pub medium_confidence_threshold: f32,

    /// Maximum number of predictions kept in the history.
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: None,
            confidence_scale: ConfidenceScale::Probability,
            confidence_threshold: 0.8,
            medium_confidence_threshold: 0.5,
            history_limit: 100,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::InvalidParameter {
                name: "confidence_threshold".to_string(),
                reason: "must be between 0.0 and 1.0".to_string(),
            });
        }

        if !(0.0..=self.confidence_threshold).contains(&self.medium_confidence_threshold) {
            return Err(Error::InvalidParameter {
                name: "medium_confidence_threshold".to_string(),
                reason: "must be between 0.0 and confidence_threshold".to_string(),
            });
        }

        if self.history_limit == 0 {
            return Err(Error::InvalidParameter {
                name: "history_limit".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Set the high-confidence threshold, lowering the medium threshold to it
    /// when it would otherwise sit above.
    #[must_use]
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self.medium_confidence_threshold = self.medium_confidence_threshold.min(threshold);
        self
    }

    /// Locator for the model artifact described by this configuration.
    #[must_use]
    pub fn locator(&self) -> ModelLocator {
        ModelLocator::new(self.model_path.clone())
    }
}

/// Recognizes digits in images and drawings with a loaded classifier.
pub struct Recognizer<M = OnnxModel> {
    config: Config,
    handle: ModelHandle<M>,
    history: PredictionHistory,
}

impl<M: Model> Recognizer<M> {
    /// Create a recognizer, locating and loading the model artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the model cannot be
    /// found or loaded.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing recognizer with config: {config:?}");

        let location = config.locator().resolve()?;
        let handle = ModelHandle::open(location)?;

        tracing::info!("Recognizer ready");
        Self::with_handle(config, handle)
    }

    /// Create a recognizer around an existing handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_handle(config: Config, handle: ModelHandle<M>) -> Result<Self> {
        config.validate()?;
        let history = PredictionHistory::new(config.history_limit);
        Ok(Self {
            config,
            handle,
            history,
        })
    }

    /// Normalize a raw image and classify it.
    ///
    /// # Errors
    ///
    /// Returns input errors from normalization and model or inference errors
    /// from classification.
    pub fn recognize(&mut self, raw: RawImage<'_>) -> Result<Prediction> {
        let kind = match raw {
            RawImage::File(path) => {
                tracing::info!("Recognizing {}", path.display());
                InputKind::File
            }
            RawImage::Drawing(buffer) => {
                tracing::info!(
                    "Recognizing drawing ({}x{})",
                    buffer.width(),
                    buffer.height()
                );
                InputKind::Drawing
            }
        };

        let tensor = image::normalize(raw)?;
        self.classify(&tensor, kind)
    }

    /// Classify an already normalized tensor and record the prediction.
    ///
    /// # Errors
    ///
    /// Returns model or inference errors from classification.
    pub fn classify(&mut self, tensor: &DigitTensor, kind: InputKind) -> Result<Prediction> {
        let prediction = self.handle.predict(tensor)?;

        tracing::info!(
            "Recognized {} ({:.1}% confidence)",
            prediction.digit(),
            prediction.confidence_on(ConfidenceScale::Percentage)
        );

        self.history.push(prediction.clone(), kind);
        Ok(prediction)
    }

    /// Recognize a digit in an image file.
    ///
    /// # Errors
    ///
    /// See [`Recognizer::recognize`].
    pub fn recognize_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Prediction> {
        self.recognize(RawImage::File(path.as_ref()))
    }

    /// Recognize a digit in a drawing buffer (black ink on white).
    ///
    /// # Errors
    ///
    /// See [`Recognizer::recognize`].
    pub fn recognize_drawing(&mut self, buffer: &GrayImage) -> Result<Prediction> {
        self.recognize(RawImage::Drawing(buffer))
    }

    /// Reload the model artifact, e.g. after retraining.
    ///
    /// # Errors
    ///
    /// Returns the load error; predictions fail until a reload succeeds.
    pub fn reload(&mut self) -> Result<()> {
        self.handle.reload()
    }

    /// Confidence of `prediction` on the configured scale.
    #[must_use]
    pub fn presented_confidence(&self, prediction: &Prediction) -> f32 {
        prediction.confidence_on(self.config.confidence_scale)
    }

    /// Confidence bucket of `prediction` under the configured thresholds.
    #[must_use]
    pub fn confidence_level(&self, prediction: &Prediction) -> ConfidenceLevel {
        prediction.level(
            self.config.confidence_threshold,
            self.config.medium_confidence_threshold,
        )
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn history(&self) -> &PredictionHistory {
        &self.history
    }

    #[must_use]
    pub fn model_location(&self) -> &Path {
        self.handle.location()
    }
}
