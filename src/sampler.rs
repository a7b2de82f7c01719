//! Weighted target selection for spins that should favour some segments.

use rand::Rng;

use crate::error::ConfigError;

/// Cumulative-weight sampler. Picks index `i` with probability
/// `weights[i] / sum(weights)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedPicker {
    cumulative: Vec<f64>,
}

impl WeightedPicker {
    pub fn new(weights: &[f64]) -> Result<Self, ConfigError> {
        if weights.is_empty() {
            return Err(ConfigError::NoSegments);
        }
        let mut total = 0.0;
        let mut cumulative = Vec::with_capacity(weights.len());
        for (index, &weight) in weights.iter().enumerate() {
            if !(weight > 0.0 && weight.is_finite()) {
                return Err(ConfigError::InvalidWeight { index, weight });
            }
            total += weight;
            cumulative.push(total);
        }
        Ok(Self { cumulative })
    }

    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Index whose cumulative band contains `point`, for `point` in `[0, total)`.
    pub fn index_at(&self, point: f64) -> usize {
        let index = self.cumulative.partition_point(|&edge| edge <= point);
        index.min(self.cumulative.len() - 1)
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let point = rng.random::<f64>() * self.total();
        self.index_at(point)
    }
}
