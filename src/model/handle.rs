//! Explicitly owned handle around a loaded classifier.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::image::{DigitTensor, DIGIT_SHAPE};

use super::{Model, OnnxModel, Prediction};

enum State<M> {
    Unloaded,
    Loaded(M),
}

/// A classifier bound to its artifact location.
///
/// Starts `Unloaded`; [`ModelHandle::load`] moves it to `Loaded`.
/// [`ModelHandle::reload`] discards the current model and loads the artifact
/// again, e.g. after retraining.
pub struct ModelHandle<M = OnnxModel> {
    location: PathBuf,
    state: State<M>,
}

impl<M> std::fmt::Debug for ModelHandle<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("location", &self.location)
            .field("loaded", &matches!(self.state, State::Loaded(_)))
            .finish()
    }
}

impl<M: Model> ModelHandle<M> {
    /// Create an unloaded handle for the artifact at `location`.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(location: P) -> Self {
        Self {
            location: location.into(),
            state: State::Unloaded,
        }
    }

    /// Create a handle and load it immediately.
    ///
    /// # Errors
    ///
    /// Returns the model's load error.
    pub fn open<P: Into<PathBuf>>(location: P) -> Result<Self> {
        let mut handle = Self::new(location);
        handle.load()?;
        Ok(handle)
    }

    /// Wrap a model that was constructed elsewhere.
    #[must_use]
    pub fn from_model<P: Into<PathBuf>>(location: P, model: M) -> Self {
        Self {
            location: location.into(),
            state: State::Loaded(model),
        }
    }

    /// Load the artifact if not loaded yet. A loaded handle is left untouched.
    ///
    /// # Errors
    ///
    /// Returns the model's load error; the handle stays unloaded.
    pub fn load(&mut self) -> Result<()> {
        if matches!(self.state, State::Unloaded) {
            self.state = State::Loaded(M::load(&self.location)?);
        }
        Ok(())
    }

    /// Drop the current model and load the artifact from scratch.
    ///
    /// # Errors
    ///
    /// Returns the model's load error; the handle is left unloaded.
    pub fn reload(&mut self) -> Result<()> {
        tracing::info!("Reloading model from {}", self.location.display());
        self.state = State::Unloaded;
        self.load()
    }

    /// Whether a model is loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self.state, State::Loaded(_))
    }

    /// Artifact location this handle loads from.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Classify a canonical tensor.
    ///
    /// The tensor is not normalized here; pass the output of the normalizer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotLoaded`] on an unloaded handle,
    /// [`Error::ShapeMismatch`] if the tensor is not `(1, 28, 28, 1)`, and any
    /// inference or output error from the model.
    pub fn predict(&mut self, tensor: &DigitTensor) -> Result<Prediction> {
        let State::Loaded(model) = &mut self.state else {
            return Err(Error::ModelNotLoaded {
                path: self.location.clone(),
            });
        };

        if tensor.shape() != DIGIT_SHAPE.as_slice() {
            return Err(Error::ShapeMismatch {
                expected: format!("{DIGIT_SHAPE:?}"),
                actual: format!("{:?}", tensor.shape()),
            });
        }

        let scores = model.predict(tensor)?;
        let prediction = Prediction::from_scores(&scores)?;

        tracing::debug!(
            "Predicted {} with confidence {:.3}",
            prediction.digit(),
            prediction.confidence()
        );

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::model::testing::{write_artifact, FakeModel};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_handle_is_unloaded() {
        let mut handle = ModelHandle::<FakeModel>::new("handwriting_model.onnx");
        assert!(!handle.is_loaded());

        let err = handle.predict(&DigitTensor::zeros(DIGIT_SHAPE)).unwrap_err();
        assert!(matches!(err, Error::ModelNotLoaded { .. }));
        assert_eq!(err.category(), ErrorCategory::Inference);
    }

    #[test]
    fn test_open_and_predict() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(dir.path());

        let mut handle = ModelHandle::<FakeModel>::open(&path).unwrap();
        assert!(handle.is_loaded());
        assert_eq!(handle.location(), path.as_path());

        let prediction = handle.predict(&DigitTensor::zeros(DIGIT_SHAPE)).unwrap();
        assert!(prediction.digit() <= 9);
        assert!((0.0..=1.0).contains(&prediction.confidence()));
    }

    #[test]
    fn test_open_missing_artifact() {
        let result = ModelHandle::<FakeModel>::open("/nonexistent/handwriting_model.onnx");
        assert!(matches!(result, Err(Error::ModelNotFound { .. })));
    }

    #[test]
    fn test_open_corrupt_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("handwriting_model.onnx");
        fs::write(&path, b"garbage").unwrap();

        let err = ModelHandle::<FakeModel>::open(&path).unwrap_err();
        assert!(matches!(err, Error::ModelFormat { .. }));
        assert_eq!(err.category(), ErrorCategory::Model);
    }

    #[test]
    fn test_wrong_shape_is_model_error() {
        let mut handle = ModelHandle::from_model("fake", FakeModel::default());
        let err = handle
            .predict(&DigitTensor::zeros((1, 32, 32, 1)))
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
        assert_eq!(err.category(), ErrorCategory::Model);

        let err = handle
            .predict(&DigitTensor::zeros((2, 28, 28, 1)))
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_reload_recreates_model() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(dir.path());
        let mut handle = ModelHandle::<FakeModel>::open(&path).unwrap();
        handle.predict(&DigitTensor::zeros(DIGIT_SHAPE)).unwrap();

        handle.reload().unwrap();
        assert!(handle.is_loaded());

        fs::remove_file(&path).unwrap();
        assert!(matches!(handle.reload(), Err(Error::ModelNotFound { .. })));
        assert!(!handle.is_loaded());
    }

    #[test]
    fn test_load_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(dir.path());
        let mut handle = ModelHandle::<FakeModel>::open(&path).unwrap();

        // Artifact gone, but an already loaded handle does not touch disk
        fs::remove_file(&path).unwrap();
        handle.load().unwrap();
        assert!(handle.is_loaded());
    }
}
