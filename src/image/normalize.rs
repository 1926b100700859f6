//! Conversion of raw images into the classifier's input tensor.
//!
//! Two entry points share one output contract. Images loaded from files are
//! blurred, thresholded and inverted to suppress scan noise. Drawings are
//! already clean black-on-white strokes and are only inverted. Both are then
//! resized to 28x28, scaled to [0, 1] and given batch and channel axes.

use std::path::Path;

use image::{imageops, imageops::FilterType, GrayImage};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::filter::separable_filter_equal;

use crate::error::{Error, Result};

use super::load::load_grayscale;
use super::{DigitTensor, CANVAS_SIZE, DIGIT_SHAPE, DIGIT_SIZE};

/// Side length of the Gaussian kernel applied to file images.
const BLUR_KERNEL_SIZE: usize = 5;

/// Pixels brighter than this become background after binarization.
const BINARY_THRESHOLD: u8 = 128;

/// A raw image on its way into the normalizer.
#[derive(Debug, Clone, Copy)]
pub enum RawImage<'a> {
    /// An image file on disk (scan or photo, dark ink on light paper).
    File(&'a Path),
    /// An in-memory drawing buffer, black ink on a white background.
    Drawing(&'a GrayImage),
}

/// Normalize a raw image into a `(1, 28, 28, 1)` tensor with values in [0, 1].
///
/// # Errors
///
/// Returns an error if a file cannot be read or decoded, or if the image has
/// zero width or height.
pub fn normalize(raw: RawImage<'_>) -> Result<DigitTensor> {
    match raw {
        RawImage::File(path) => normalize_from_file(path),
        RawImage::Drawing(buffer) => normalize_from_drawing(buffer),
    }
}

/// Load an image file and normalize it.
///
/// Pipeline: grayscale, 5x5 Gaussian blur, inverted binary threshold at 128,
/// linear resize to 28x28, scale to [0, 1].
///
/// # Errors
///
/// Returns [`Error::ImageNotFound`] or [`Error::ImageDecode`] when loading
/// fails, and [`Error::DegenerateImage`] for empty images.
pub fn normalize_from_file<P: AsRef<Path>>(path: P) -> Result<DigitTensor> {
    let path = path.as_ref();
    let gray = load_grayscale(path)?;
    ensure_not_empty(&gray, "decode")?;

    tracing::debug!(
        "Normalizing file {} ({}x{})",
        path.display(),
        gray.width(),
        gray.height()
    );

    let kernel = gaussian_kernel(BLUR_KERNEL_SIZE);
    let blurred = separable_filter_equal(&gray, kernel.as_slice());
    let binary = threshold(&blurred, BINARY_THRESHOLD, ThresholdType::BinaryInverted);

    to_tensor(&resize(&binary)?)
}

/// Normalize a drawing buffer (black ink on white).
///
/// Pipeline: invert, linear resize to 28x28, scale to [0, 1]. No blur or
/// threshold is applied on this path.
///
/// # Errors
///
/// Returns [`Error::DegenerateImage`] if the buffer is empty.
pub fn normalize_from_drawing(buffer: &GrayImage) -> Result<DigitTensor> {
    ensure_not_empty(buffer, "drawing")?;

    if buffer.dimensions() != (CANVAS_SIZE, CANVAS_SIZE) {
        tracing::warn!(
            "Drawing buffer is {}x{}, expected {CANVAS_SIZE}x{CANVAS_SIZE}; resizing anyway",
            buffer.width(),
            buffer.height()
        );
    }

    let mut inverted = buffer.clone();
    imageops::invert(&mut inverted);

    to_tensor(&resize(&inverted)?)
}

fn ensure_not_empty(img: &GrayImage, stage: &'static str) -> Result<()> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::DegenerateImage {
            width,
            height,
            stage,
        });
    }
    Ok(())
}

fn resize(img: &GrayImage) -> Result<GrayImage> {
    ensure_not_empty(img, "resize")?;
    Ok(imageops::resize(img, DIGIT_SIZE, DIGIT_SIZE, FilterType::Triangle))
}

/// Scale a 28x28 grayscale image into an NHWC tensor.
fn to_tensor(img: &GrayImage) -> Result<DigitTensor> {
    if img.dimensions() != (DIGIT_SIZE, DIGIT_SIZE) {
        return Err(Error::ShapeMismatch {
            expected: format!("{DIGIT_SIZE}x{DIGIT_SIZE} image"),
            actual: format!("{}x{} image", img.width(), img.height()),
        });
    }

    #[allow(clippy::cast_possible_truncation)]
    let tensor = DigitTensor::from_shape_fn(DIGIT_SHAPE, |(_, y, x, _)| {
        // Safe: x and y are bounded by DIGIT_SIZE (28)
        f32::from(img.get_pixel(x as u32, y as u32)[0]) / 255.0
    });

    Ok(tensor)
}

/// Normalized 1-D Gaussian kernel of the given odd size.
///
/// Sigma is derived from the size the same way common vision libraries do when
/// no sigma is given: `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
#[allow(clippy::cast_precision_loss)]
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3_f32.mul_add((size as f32 - 1.0).mul_add(0.5, -1.0), 0.8);
    let center = (size / 2) as f32;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / two_sigma_sq).exp()
        })
        .collect();

    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}
