//! Locating the trained model artifact on disk.

use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// File name of the trained classifier.
pub const MODEL_FILENAME: &str = "handwriting_model.onnx";

/// Directory name used under the platform data directory.
const APP_DIR: &str = "digit-recognizer";

/// Where a candidate location stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateStatus {
    pub path: PathBuf,
    /// Size in bytes, or `None` if no file exists there.
    pub size: Option<u64>,
}

/// Resolves the model artifact from an explicit path or well-known locations.
///
/// Without an explicit path the following are tried in order:
/// - `./models/handwriting_model.onnx`
/// - `./handwriting_model.onnx`
/// - the platform data directory, e.g. `~/.local/share/digit-recognizer/handwriting_model.onnx`
#[derive(Debug, Clone)]
pub struct ModelLocator {
    candidates: Vec<PathBuf>,
}

impl Default for ModelLocator {
    fn default() -> Self {
        let mut candidates = vec![
            PathBuf::from("models").join(MODEL_FILENAME),
            PathBuf::from(MODEL_FILENAME),
        ];
        if let Some(data_dir) = dirs::data_dir() {
            candidates.push(data_dir.join(APP_DIR).join(MODEL_FILENAME));
        }
        Self { candidates }
    }
}

impl ModelLocator {
    /// Locator that searches the well-known locations, or only `explicit` if given.
    #[must_use]
    pub fn new(explicit: Option<PathBuf>) -> Self {
        explicit.map_or_else(Self::default, |path| Self {
            candidates: vec![path],
        })
    }

    /// Candidate paths in search order.
    #[must_use]
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// The first candidate that exists as a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotFound`] naming the first candidate if none exist.
    pub fn resolve(&self) -> Result<PathBuf> {
        if let Some(found) = self.candidates.iter().find(|p| p.is_file()) {
            tracing::debug!("Resolved model artifact: {}", found.display());
            return Ok(found.clone());
        }

        Err(Error::ModelNotFound {
            path: self
                .candidates
                .first()
                .cloned()
                .unwrap_or_else(|| PathBuf::from(MODEL_FILENAME)),
        })
    }

    /// Existence and size of every candidate.
    #[must_use]
    pub fn status(&self) -> Vec<CandidateStatus> {
        self.candidates
            .iter()
            .map(|path| CandidateStatus {
                path: path.clone(),
                size: fs::metadata(path)
                    .ok()
                    .filter(fs::Metadata::is_file)
                    .map(|m| m.len()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_path_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.onnx");
        fs::write(&path, b"bytes").unwrap();

        let locator = ModelLocator::new(Some(path.clone()));
        assert_eq!(locator.candidates(), &[path.clone()]);
        assert_eq!(locator.resolve().unwrap(), path);
    }

    #[test]
    fn test_missing_explicit_path() {
        let locator = ModelLocator::new(Some(PathBuf::from("/nonexistent/model.onnx")));
        match locator.resolve() {
            Err(Error::ModelNotFound { path }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/model.onnx"));
            }
            other => panic!("expected ModelNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_directory_is_not_a_model() {
        let dir = TempDir::new().unwrap();
        let locator = ModelLocator::new(Some(dir.path().to_path_buf()));
        assert!(matches!(locator.resolve(), Err(Error::ModelNotFound { .. })));
    }

    #[test]
    fn test_default_search_order() {
        let locator = ModelLocator::default();
        let candidates = locator.candidates();
        assert_eq!(candidates[0], PathBuf::from("models/handwriting_model.onnx"));
        assert_eq!(candidates[1], PathBuf::from("handwriting_model.onnx"));
        assert!(candidates.iter().all(|p| p.ends_with(MODEL_FILENAME)));
    }

    #[test]
    fn test_status_reports_size() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("a.onnx");
        fs::write(&present, vec![0u8; 42]).unwrap();
        let absent = dir.path().join("b.onnx");

        let locator = ModelLocator {
            candidates: vec![present.clone(), absent.clone()],
        };
        let status = locator.status();
        assert_eq!(
            status,
            vec![
                CandidateStatus {
                    path: present,
                    size: Some(42)
                },
                CandidateStatus {
                    path: absent,
                    size: None
                },
            ]
        );
    }
}
