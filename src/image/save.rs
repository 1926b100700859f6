//! Saving the network input back to disk for inspection.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GrayImage, Luma};

use crate::error::{Error, Result};

use super::{DigitTensor, DIGIT_SHAPE, DIGIT_SIZE};

/// Save a normalized tensor as a grayscale image.
///
/// The tensor is:
/// 1. Denormalized from [0, 1] to [0, 255] (ink stays white, as the network sees it)
/// 2. Enlarged by `upscale` with nearest-neighbour sampling so pixels stay crisp
/// 3. Saved to the specified path (format inferred from extension)
///
/// # Arguments
///
/// * `tensor` - NHWC tensor of shape (1, 28, 28, 1)
/// * `path` - Output file path
/// * `upscale` - Integer magnification, 1 keeps the 28x28 size
///
/// # Errors
///
/// Returns an error if the tensor has the wrong shape, `upscale` is zero, or
/// the image cannot be saved.
pub fn save_tensor<P: AsRef<Path>>(tensor: &DigitTensor, path: P, upscale: u32) -> Result<()> {
    let path = path.as_ref();

    if tensor.shape() != DIGIT_SHAPE.as_slice() {
        return Err(Error::ShapeMismatch {
            expected: format!("{DIGIT_SHAPE:?}"),
            actual: format!("{:?}", tensor.shape()),
        });
    }

    if upscale == 0 {
        return Err(Error::InvalidParameter {
            name: "upscale".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    let img = tensor_to_image(tensor);
    let final_img = if upscale > 1 {
        DynamicImage::ImageLuma8(img).resize_exact(
            DIGIT_SIZE * upscale,
            DIGIT_SIZE * upscale,
            FilterType::Nearest,
        )
    } else {
        DynamicImage::ImageLuma8(img)
    };

    final_img.save(path).map_err(|source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Saved network input to {}", path.display());
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn tensor_to_image(tensor: &DigitTensor) -> GrayImage {
    GrayImage::from_fn(DIGIT_SIZE, DIGIT_SIZE, |x, y| {
        Luma([denormalize(tensor[[0, y as usize, x as usize, 0]])])
    })
}

/// Denormalize a value from [0, 1] to [0, 255] with clamping.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn denormalize(value: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
