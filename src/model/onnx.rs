//! ONNX Runtime backend for the digit classifier.

use std::path::{Path, PathBuf};

use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::{Tensor, ValueType};

use crate::error::{Error, Result};
use crate::image::{DigitTensor, DIGIT_SHAPE};

use super::{Model, NUM_CLASSES};

/// A classifier exported to ONNX and executed with ONNX Runtime.
///
/// Expects one float input of shape `(1, 28, 28, 1)` and produces ten class
/// scores as its first output.
pub struct OnnxModel {
    session: Session,
    path: PathBuf,
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl OnnxModel {
    /// Path the session was built from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Model for OnnxModel {
    fn load(location: &Path) -> Result<Self> {
        if !location.is_file() {
            return Err(Error::ModelNotFound {
                path: location.to_path_buf(),
            });
        }

        tracing::info!("Loading classifier from {}", location.display());

        let session = Session::builder()
            .map_err(|source| Error::ModelLoad {
                path: location.to_path_buf(),
                source,
            })?
            .commit_from_file(location)
            .map_err(|source| Error::ModelLoad {
                path: location.to_path_buf(),
                source,
            })?;

        let format_error = |reason: String| Error::ModelFormat {
            path: location.to_path_buf(),
            reason,
        };

        if session.inputs.len() != 1 {
            return Err(format_error(format!(
                "expected 1 input, found {}",
                session.inputs.len()
            )));
        }
        let input = &session.inputs[0];
        match &input.input_type {
            ValueType::Tensor { ty, shape, .. } => {
                check_input_signature(*ty, shape)
                    .map_err(|reason| format_error(format!("input '{}': {reason}", input.name)))?;
            }
            other => {
                return Err(format_error(format!(
                    "input '{}' must be a tensor, found {other:?}",
                    input.name
                )));
            }
        }

        let Some(output) = session.outputs.first() else {
            return Err(format_error("model has no outputs".to_string()));
        };
        match &output.output_type {
            ValueType::Tensor { ty, shape, .. } => {
                check_output_signature(*ty, shape).map_err(|reason| {
                    format_error(format!("output '{}': {reason}", output.name))
                })?;
            }
            other => {
                return Err(format_error(format!(
                    "output '{}' must be a tensor, found {other:?}",
                    output.name
                )));
            }
        }

        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classifier output[{i}]: '{}'", output.name);
        }

        Ok(Self {
            session,
            path: location.to_path_buf(),
        })
    }

    fn predict(&mut self, tensor: &DigitTensor) -> Result<Vec<f32>> {
        let shape = tensor.shape().to_vec();
        let context = |stage: &str| format!("{stage} for input of shape {shape:?}");

        let input_value = Tensor::from_array(tensor.clone()).map_err(|source| Error::Inference {
            context: context("building input tensor"),
            source,
        })?;

        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|source| Error::Inference {
                context: context("running classifier"),
                source,
            })?;

        // Get first output
        let output = outputs
            .values()
            .next()
            .ok_or_else(|| Error::InvalidOutput {
                reason: "classifier produced no output".to_string(),
            })?;

        let (shape_info, data) =
            output
                .try_extract_tensor::<f32>()
                .map_err(|source| Error::Inference {
                    context: context("extracting class scores"),
                    source,
                })?;

        if !is_class_score_shape(shape_info) || data.len() != NUM_CLASSES {
            return Err(Error::InvalidOutput {
                reason: format!(
                    "expected {NUM_CLASSES} class scores of shape [1, {NUM_CLASSES}] or [{NUM_CLASSES}], got shape {:?}",
                    &shape_info[..]
                ),
            });
        }

        Ok(data.to_vec())
    }
}

/// Dynamic dimensions are reported as -1.
fn dim_matches(declared: i64, expected: usize) -> bool {
    declared < 0 || usize::try_from(declared).is_ok_and(|d| d == expected)
}

/// The input must be f32 NHWC `(1, 28, 28, 1)`; the batch axis may be dynamic.
fn check_input_signature(
    ty: TensorElementType,
    dims: &[i64],
) -> std::result::Result<(), String> {
    if ty != TensorElementType::Float32 {
        return Err(format!("expected f32 elements, found {ty:?}"));
    }
    let matches = dims.len() == DIGIT_SHAPE.len()
        && dims.iter().zip(DIGIT_SHAPE).all(|(&d, e)| dim_matches(d, e));
    if !matches {
        return Err(format!("expected shape {DIGIT_SHAPE:?}, found {dims:?}"));
    }
    Ok(())
}

/// The first output must be f32 scores over the ten digits, `[N, 10]` or `[10]`.
fn check_output_signature(
    ty: TensorElementType,
    dims: &[i64],
) -> std::result::Result<(), String> {
    if ty != TensorElementType::Float32 {
        return Err(format!("expected f32 elements, found {ty:?}"));
    }
    let matches = match dims {
        [classes] => dim_matches(*classes, NUM_CLASSES),
        [batch, classes] => dim_matches(*batch, 1) && dim_matches(*classes, NUM_CLASSES),
        _ => false,
    };
    if !matches {
        return Err(format!("expected [1, {NUM_CLASSES}] class scores, found {dims:?}"));
    }
    Ok(())
}

/// Shape of a produced score tensor: exactly `[1, 10]` or `[10]`.
fn is_class_score_shape(dims: &[i64]) -> bool {
    let classes = i64::try_from(NUM_CLASSES).unwrap_or(i64::MAX);
    matches!(dims, [c] if *c == classes) || matches!(dims, [1, c] if *c == classes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_missing_artifact() {
        let result = OnnxModel::load(Path::new("/nonexistent/handwriting_model.onnx"));
        match result {
            Err(err @ Error::ModelNotFound { .. }) => {
                assert_eq!(err.category(), ErrorCategory::Model);
            }
            other => panic!("expected ModelNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_load_garbage_artifact() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\x00\x01truncated garbage, not a protobuf graph")
            .unwrap();

        let result = OnnxModel::load(file.path());
        match result {
            Err(err @ (Error::ModelLoad { .. } | Error::ModelFormat { .. })) => {
                assert_eq!(err.category(), ErrorCategory::Model);
            }
            other => panic!("expected a load error, got {other:?}"),
        }
    }

    #[test]
    fn test_input_signature_nhwc() {
        assert!(check_input_signature(TensorElementType::Float32, &[1, 28, 28, 1]).is_ok());
        assert!(check_input_signature(TensorElementType::Float32, &[-1, 28, 28, 1]).is_ok());
    }

    #[test]
    fn test_input_signature_rejects_nchw() {
        let reason =
            check_input_signature(TensorElementType::Float32, &[1, 1, 28, 28]).unwrap_err();
        assert!(reason.contains("[1, 1, 28, 28]"));
        assert!(check_input_signature(TensorElementType::Float32, &[28, 28]).is_err());
        assert!(check_input_signature(TensorElementType::Float32, &[2, 28, 28, 1]).is_err());
    }

    #[test]
    fn test_input_signature_rejects_non_float() {
        let reason = check_input_signature(TensorElementType::Uint8, &[1, 28, 28, 1]).unwrap_err();
        assert!(reason.contains("f32"));
    }

    #[test]
    fn test_output_signature() {
        assert!(check_output_signature(TensorElementType::Float32, &[1, 10]).is_ok());
        assert!(check_output_signature(TensorElementType::Float32, &[-1, 10]).is_ok());
        assert!(check_output_signature(TensorElementType::Float32, &[10]).is_ok());
        assert!(check_output_signature(TensorElementType::Float32, &[1, 26]).is_err());
        assert!(check_output_signature(TensorElementType::Float32, &[1, 10, 1]).is_err());
        assert!(check_output_signature(TensorElementType::Float64, &[1, 10]).is_err());
    }

    #[test]
    fn test_class_score_shape() {
        assert!(is_class_score_shape(&[1, 10]));
        assert!(is_class_score_shape(&[10]));
        assert!(!is_class_score_shape(&[2, 10]));
        assert!(!is_class_score_shape(&[1, 11]));
        assert!(!is_class_score_shape(&[1, 1, 10]));
    }
}
