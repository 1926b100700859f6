//! Recognition pipeline: configuration, recognizer, and prediction history.

mod history;
mod recognizer;

pub use history::{HistoryEntry, HistorySummary, InputKind, PredictionHistory};
pub use recognizer::{Config, Recognizer};
