//! Classifier abstraction, ONNX backend, and prediction results.

mod handle;
mod loader;
mod onnx;
mod prediction;

pub use handle::ModelHandle;
pub use loader::{CandidateStatus, ModelLocator, MODEL_FILENAME};
pub use onnx::OnnxModel;
pub use prediction::{ConfidenceLevel, ConfidenceScale, Prediction, NUM_CLASSES};

use std::path::Path;

use crate::error::Result;
use crate::image::DigitTensor;

/// A trained digit classifier.
///
/// Implementations own whatever runtime state the backend needs. Calls take
/// `&mut self`; share a model across threads by wrapping it in a mutex or by
/// loading one instance per worker.
pub trait Model: Sized {
    /// Load a classifier from an artifact on disk.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ModelNotFound`] if nothing exists at `location`
    /// and a load or format error if the artifact cannot be used.
    fn load(location: &Path) -> Result<Self>;

    /// Score a canonical `(1, 28, 28, 1)` tensor, returning one value per class.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to run.
    fn predict(&mut self, tensor: &DigitTensor) -> Result<Vec<f32>>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process stand-in for a trained classifier.

    use std::fs;
    use std::path::Path;

    use super::{Model, NUM_CLASSES};
    use crate::error::{Error, Result};
    use crate::image::DigitTensor;

    /// Contents a fake artifact must have to load.
    pub const FAKE_ARTIFACT: &[u8] = b"fake-digit-model";

    /// Picks a digit from the amount of ink in the tensor.
    #[derive(Debug, Default)]
    pub struct FakeModel {
        pub calls: usize,
    }

    impl Model for FakeModel {
        fn load(location: &Path) -> Result<Self> {
            if !location.exists() {
                return Err(Error::ModelNotFound {
                    path: location.to_path_buf(),
                });
            }
            if fs::read(location)? != FAKE_ARTIFACT {
                return Err(Error::ModelFormat {
                    path: location.to_path_buf(),
                    reason: "not a fake model".to_string(),
                });
            }
            Ok(Self::default())
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        fn predict(&mut self, tensor: &DigitTensor) -> Result<Vec<f32>> {
            self.calls += 1;
            let ink = tensor.sum();
            let digit = (ink as usize) % NUM_CLASSES;
            let mut probs = vec![0.02; NUM_CLASSES];
            probs[digit] = 0.82;
            Ok(probs)
        }
    }

    /// Write a loadable fake artifact into `dir`.
    pub fn write_artifact(dir: &Path) -> std::path::PathBuf {
        let path = dir.join(super::MODEL_FILENAME);
        fs::write(&path, FAKE_ARTIFACT).unwrap();
        path
    }
}
