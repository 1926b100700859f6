//! Custom error types for digit-recognizer.

use std::path::PathBuf;
use thiserror::Error;

/// Broad origin of a failure, so callers can tell "fix your image" apart from
/// "fix or retrain your model".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The input image or a caller-supplied parameter is unusable.
    Input,
    /// The model artifact is missing, corrupt, or incompatible with the input.
    Model,
    /// The runtime failed while executing an otherwise valid model.
    Inference,
}

/// Main error type for the digit-recognizer library.
#[derive(Error, Debug)]
pub enum Error {
    /// The image path does not exist.
    #[error("image not found: {path}")]
    ImageNotFound { path: PathBuf },

    /// The image path exists but could not be read.
    #[error("failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image bytes could not be decoded.
    #[error("failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The image has no pixels to resize.
    #[error("degenerate image {width}x{height} at {stage} stage")]
    DegenerateImage {
        width: u32,
        height: u32,
        stage: &'static str,
    },

    /// No model artifact at the expected location.
    #[error("model not found: {path}")]
    ModelNotFound { path: PathBuf },

    /// ONNX Runtime refused to build a session from the artifact.
    #[error("failed to load ONNX model {path}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    /// The artifact loaded but is not a usable digit classifier.
    #[error("invalid model {path}: {reason}")]
    ModelFormat { path: PathBuf, reason: String },

    /// Tensor shape does not match what the classifier expects.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// The classifier produced output that cannot be read as class scores.
    #[error("invalid model output: {reason}")]
    InvalidOutput { reason: String },

    /// Prediction was requested before the model was loaded.
    #[error("model {path} is not loaded")]
    ModelNotLoaded { path: PathBuf },

    /// Model inference failed.
    #[error("model inference failed while {context}: {source}")]
    Inference {
        context: String,
        #[source]
        source: ort::Error,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Which side of the system this failure belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ImageNotFound { .. }
            | Self::ImageRead { .. }
            | Self::ImageDecode { .. }
            | Self::ImageSave { .. }
            | Self::DegenerateImage { .. }
            | Self::InvalidParameter { .. }
            | Self::Io(_) => ErrorCategory::Input,
            Self::ModelNotFound { .. }
            | Self::ModelLoad { .. }
            | Self::ModelFormat { .. }
            | Self::ShapeMismatch { .. }
            | Self::InvalidOutput { .. } => ErrorCategory::Model,
            Self::ModelNotLoaded { .. } | Self::Inference { .. } => ErrorCategory::Inference,
        }
    }
}

/// Result type alias for digit-recognizer operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_input_category() {
        let err = Error::ImageNotFound {
            path: PathBuf::from("missing.png"),
        };
        assert_eq!(err.category(), ErrorCategory::Input);

        let err = Error::DegenerateImage {
            width: 0,
            height: 10,
            stage: "resize",
        };
        assert_eq!(err.category(), ErrorCategory::Input);
    }

    #[test]
    fn test_shape_mismatch_is_model_category() {
        let err = Error::ShapeMismatch {
            expected: "[1, 28, 28, 1]".to_string(),
            actual: "[1, 32, 32, 1]".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Model);
        assert!(err.to_string().contains("[1, 32, 32, 1]"));
    }

    #[test]
    fn test_unloaded_handle_is_inference_category() {
        let err = Error::ModelNotLoaded {
            path: PathBuf::from("handwriting_model.onnx"),
        };
        assert_eq!(err.category(), ErrorCategory::Inference);
    }
}
