//! Turning a probability distribution into a bounded, thresholded shortlist.

use serde::{Deserialize, Serialize};

/// Top-k then threshold.
///
/// The cut to `top_k` happens before the threshold, so a class ranked
/// below `top_k` is never reported even if it clears `min_confidence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingPolicy {
    pub top_k: usize,
    /// Exclusive lower bound on reported probabilities
    pub min_confidence: f64,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self { top_k: 3, min_confidence: 0.10 }
    }
}

impl RankingPolicy {
    /// Select `(class_index, probability)` pairs, highest probability first.
    /// Equal probabilities keep class-index order.
    pub fn select(&self, probabilities: &[f64]) -> Vec<(usize, f64)> {
        let mut indexed: Vec<(usize, f64)> = probabilities
            .iter()
            .copied()
            .enumerate()
            .collect();

        // sort_by is stable
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        indexed.truncate(self.top_k);
        indexed.retain(|&(_, p)| p > self.min_confidence);
        indexed
    }
}
