//! Image loading utilities.

use std::io::ErrorKind;
use std::path::Path;

use image::{GrayImage, ImageReader};

use crate::error::{Error, Result};

/// File extensions accepted by the file entry point.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Load an image from disk as 8-bit grayscale.
///
/// The format is detected from the file contents rather than the extension,
/// and color images are reduced to luma.
///
/// # Errors
///
/// Returns [`Error::ImageNotFound`] if nothing exists at `path`,
/// [`Error::ImageRead`] if it cannot be opened, and [`Error::ImageDecode`] if
/// the bytes are not a supported image.
pub fn load_grayscale<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    let path = path.as_ref();

    let reader = ImageReader::open(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            Error::ImageNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::ImageRead {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let reader = reader
        .with_guessed_format()
        .map_err(|source| Error::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;

    let img = reader.decode().map_err(|source| Error::ImageDecode {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(img.to_luma8())
}

/// Whether a path has one of the [`SUPPORTED_EXTENSIONS`] (case-insensitive).
#[must_use]
pub fn is_supported_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_missing_file() {
        let result = load_grayscale("/nonexistent/path/digit.png");
        assert!(matches!(result, Err(Error::ImageNotFound { .. })));
    }

    #[test]
    fn test_garbage_bytes() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"definitely not an image").unwrap();

        let result = load_grayscale(file.path());
        assert!(matches!(result, Err(Error::ImageDecode { .. })));
    }

    #[test]
    fn test_color_image_becomes_grayscale() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("red.png");
        RgbImage::from_pixel(12, 8, Rgb([255, 0, 0])).save(&path).unwrap();

        let gray = load_grayscale(&path).unwrap();
        assert_eq!(gray.dimensions(), (12, 8));
        // Pure red maps to a mid-dark luma value, identical for every pixel
        let first = gray.get_pixel(0, 0)[0];
        assert!(first > 0 && first < 255);
        assert!(gray.pixels().all(|p| p[0] == first));
    }

    #[test]
    fn test_format_detected_from_contents() {
        let dir = TempDir::new().unwrap();
        let png_path = dir.path().join("digit.png");
        GrayImage::new(4, 4).save(&png_path).unwrap();

        let misnamed = dir.path().join("digit.bmp");
        std::fs::copy(&png_path, &misnamed).unwrap();

        assert!(load_grayscale(&misnamed).is_ok());
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_path(Path::new("a.png")));
        assert!(is_supported_path(Path::new("b.JPG")));
        assert!(is_supported_path(Path::new("c.jpeg")));
        assert!(is_supported_path(Path::new("d.bmp")));
        assert!(!is_supported_path(Path::new("e.gif")));
        assert!(!is_supported_path(Path::new("noext")));
    }
}
