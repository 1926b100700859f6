//! Bounded record of recent predictions.

use std::collections::VecDeque;
use std::time::SystemTime;

use crate::model::{Prediction, NUM_CLASSES};

/// Which entry point produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    File,
    Drawing,
}

/// One recorded prediction.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub prediction: Prediction,
    pub input: InputKind,
    pub timestamp: SystemTime,
}

/// Aggregate view over a history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub total: usize,
    /// Mean confidence in [0, 1], `None` when empty.
    pub mean_confidence: Option<f32>,
    /// Number of predictions per digit.
    pub digit_counts: [usize; NUM_CLASSES],
    /// Predictions at or above the high-confidence threshold.
    pub high_confidence: usize,
}

/// Append-only list of predictions that evicts the oldest entry once `limit`
/// is reached.
#[derive(Debug, Clone)]
pub struct PredictionHistory {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl PredictionHistory {
    /// Create an empty history keeping at most `limit` entries (at least one).
    #[must_use]
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            entries: VecDeque::with_capacity(limit.min(1024)),
            limit,
        }
    }

    /// Record a prediction made now.
    pub fn push(&mut self, prediction: Prediction, input: InputKind) {
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            prediction,
            input,
            timestamp: SystemTime::now(),
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Summarize the retained entries; `high_threshold` decides which count
    /// as high confidence.
    #[must_use]
    pub fn summary(&self, high_threshold: f32) -> HistorySummary {
        let mut digit_counts = [0; NUM_CLASSES];
        let mut high_confidence = 0;
        let mut confidence_sum = 0.0_f32;

        for entry in &self.entries {
            digit_counts[usize::from(entry.prediction.digit())] += 1;
            confidence_sum += entry.prediction.confidence();
            if entry.prediction.confidence() >= high_threshold {
                high_confidence += 1;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let mean_confidence =
            (!self.entries.is_empty()).then(|| confidence_sum / self.entries.len() as f32);

        HistorySummary {
            total: self.entries.len(),
            mean_confidence,
            digit_counts,
            high_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(digit: usize, confidence: f32) -> Prediction {
        let mut scores = [(1.0 - confidence) / 9.0; NUM_CLASSES];
        scores[digit] = confidence;
        Prediction::from_scores(&scores).unwrap()
    }

    #[test]
    fn test_push_and_latest() {
        let mut history = PredictionHistory::new(10);
        assert!(history.is_empty());
        assert!(history.latest().is_none());

        history.push(prediction(4, 0.9), InputKind::File);
        history.push(prediction(2, 0.7), InputKind::Drawing);

        assert_eq!(history.len(), 2);
        let latest = history.latest().unwrap();
        assert_eq!(latest.prediction.digit(), 2);
        assert_eq!(latest.input, InputKind::Drawing);
    }

    #[test]
    fn test_oldest_evicted_at_limit() {
        let mut history = PredictionHistory::new(3);
        for digit in 0..5 {
            history.push(prediction(digit, 0.9), InputKind::File);
        }

        assert_eq!(history.len(), 3);
        let digits: Vec<u8> = history.iter().map(|e| e.prediction.digit()).collect();
        assert_eq!(digits, vec![2, 3, 4]);
    }

    #[test]
    fn test_zero_limit_keeps_one() {
        let mut history = PredictionHistory::new(0);
        assert_eq!(history.limit(), 1);
        history.push(prediction(1, 0.9), InputKind::File);
        history.push(prediction(8, 0.9), InputKind::File);
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().prediction.digit(), 8);
    }

    #[test]
    fn test_summary() {
        let mut history = PredictionHistory::new(100);
        history.push(prediction(7, 0.9), InputKind::File);
        history.push(prediction(7, 0.5), InputKind::Drawing);
        history.push(prediction(1, 0.7), InputKind::File);

        let summary = history.summary(0.8);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.digit_counts[7], 2);
        assert_eq!(summary.digit_counts[1], 1);
        assert_eq!(summary.high_confidence, 1);
        assert!((summary.mean_confidence.unwrap() - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_empty_summary() {
        let history = PredictionHistory::new(5);
        let summary = history.summary(0.8);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.mean_confidence, None);
        assert_eq!(summary.digit_counts, [0; NUM_CLASSES]);
    }

    #[test]
    fn test_clear() {
        let mut history = PredictionHistory::new(5);
        history.push(prediction(3, 0.9), InputKind::File);
        history.clear();
        assert!(history.is_empty());
    }
}
