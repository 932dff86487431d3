use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::core::FeatureVector;

/// Classifier boundary.
///
/// Implementations return `0` when the features indicate a seizure and
/// `1` when they do not. Any other value is rejected by the inference step.
#[async_trait]
pub trait ModelService: Send + Sync {
    async fn predict(&self, features: &FeatureVector) -> Result<i64>;

    fn name(&self) -> &str {
        "model"
    }
}

/// Linear decision function exported from the offline training job.
///
/// `score = w·x + b`; a non-negative score is the "no seizure" output (`1`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearModel {
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        Self { weights, bias }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read model file {}", path.display()))?;

        let model: Self = serde_json::from_str(&content).context("Failed to parse model JSON")?;
        if model.weights.is_empty() {
            bail!("Model has no weights");
        }
        Ok(model)
    }

    pub fn score(&self, features: &FeatureVector) -> Result<f64> {
        if features.len() != self.weights.len() {
            bail!(
                "Expected {} features, got {}",
                self.weights.len(),
                features.len()
            );
        }

        let dot: f64 = self
            .weights
            .iter()
            .zip(features.as_slice())
            .map(|(w, x)| w * x)
            .sum();
        Ok(dot + self.bias)
    }
}

#[async_trait]
impl ModelService for LinearModel {
    async fn predict(&self, features: &FeatureVector) -> Result<i64> {
        let score = self.score(features)?;
        if !score.is_finite() {
            bail!("Non-finite decision score");
        }
        Ok(if score >= 0.0 { 1 } else { 0 })
    }

    fn name(&self) -> &str {
        "linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_linear_model_threshold() {
        let model = LinearModel::new(vec![1.0, -1.0], 0.0);

        assert_eq!(model.predict(&FeatureVector::from([2.0, 1.0])).await.unwrap(), 1);
        assert_eq!(model.predict(&FeatureVector::from([1.0, 2.0])).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_linear_model_rejects_wrong_arity() {
        let model = LinearModel::new(vec![1.0; 8], 0.0);
        assert!(model.predict(&FeatureVector::from([1.0, 2.0])).await.is_err());
    }
}
