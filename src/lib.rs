//! # digit-recognizer
//!
//! Handwritten digit recognition with a convolutional classifier exported to
//! ONNX and trained on MNIST-style 28x28 grayscale digits.
//!
//! Images reach the classifier through one normalizer with two entry points:
//! image files (blurred, thresholded, inverted) and in-memory drawings
//! (inverted only). Both produce a `(1, 28, 28, 1)` tensor in [0, 1] with
//! ink high, which a [`ModelHandle`] turns into a [`Prediction`].
//!
//! ## Example
//!
//! ```no_run
//! use digit_recognizer::{Config, Recognizer};
//!
//! # fn main() -> digit_recognizer::Result<()> {
//! let mut recognizer: Recognizer = Recognizer::new(Config::default())?;
//!
//! let prediction = recognizer.recognize_file("digit.png")?;
//! println!("{} ({:.2})", prediction.digit(), prediction.confidence());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;

pub use error::{Error, ErrorCategory, Result};
pub use model::{Model, ModelHandle, OnnxModel, Prediction};
pub use pipeline::{Config, Recognizer};
