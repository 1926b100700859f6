//! Image loading, normalization, and canvas utilities.

mod canvas;
mod load;
mod normalize;
mod save;

pub use canvas::{sample_seven, Canvas, DEFAULT_BRUSH_RADIUS};
pub use load::{is_supported_path, load_grayscale, SUPPORTED_EXTENSIONS};
pub use normalize::{normalize, normalize_from_drawing, normalize_from_file, RawImage};
pub use save::save_tensor;

use ndarray::Array4;

/// Network input tensor in NHWC format (batch, height, width, channels).
/// Values are in [0, 1] with ink high and background low.
pub type DigitTensor = Array4<f32>;

/// Side length of the classifier input (MNIST resolution).
pub const DIGIT_SIZE: u32 = 28;

/// Canonical tensor shape: one grayscale 28x28 image.
pub const DIGIT_SHAPE: [usize; 4] = [1, DIGIT_SIZE as usize, DIGIT_SIZE as usize, 1];

/// Side length of the drawing surface.
pub const CANVAS_SIZE: u32 = 280;
