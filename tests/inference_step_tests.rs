use anyhow::{anyhow, Result};
use async_trait::async_trait;
use seizure_watch::core::FeatureVector;
use seizure_watch::inference::{InferenceStep, Label, LinearModel, ModelService};
use seizure_watch::StreamError;
use std::sync::{Arc, Mutex};

struct FixedModel(i64);

#[async_trait]
impl ModelService for FixedModel {
    async fn predict(&self, _features: &FeatureVector) -> Result<i64> {
        Ok(self.0)
    }
}

struct RecordingModel {
    seen: Mutex<Vec<Vec<f64>>>,
}

#[async_trait]
impl ModelService for RecordingModel {
    async fn predict(&self, features: &FeatureVector) -> Result<i64> {
        self.seen.lock().unwrap().push(features.as_slice().to_vec());
        Ok(0)
    }
}

struct BrokenModel;

#[async_trait]
impl ModelService for BrokenModel {
    async fn predict(&self, _features: &FeatureVector) -> Result<i64> {
        Err(anyhow!("model file corrupted"))
    }
}

#[tokio::test]
async fn test_label_one_is_no_seizure() {
    let step = InferenceStep::new(Arc::new(FixedModel(1)));
    let features = FeatureVector::from([7.0, 50.0, 50.0, 50.0, 0.0, 50.0, 50.0, 50.0]);

    let outcome = step.infer(&features).await.unwrap();

    assert_eq!(outcome.label, Label::NoSeizure);
    assert_eq!(outcome.rendered_message, Label::NoSeizure.message());
    assert_eq!(outcome.sequence_position, 0);
}

#[tokio::test]
async fn test_label_zero_is_seizure() {
    let model = Arc::new(RecordingModel {
        seen: Mutex::new(Vec::new()),
    });
    let step = InferenceStep::new(model.clone());

    let outcome = step.infer(&FeatureVector::from([1.0, 2.0])).await.unwrap();

    assert_eq!(outcome.label, Label::Seizure);
    assert!(outcome.label.is_seizure());
    assert_eq!(model.seen.lock().unwrap().as_slice(), &[vec![1.0, 2.0]]);
}

#[tokio::test]
async fn test_positions_increase_per_outcome() {
    let step = InferenceStep::new(Arc::new(FixedModel(1)));
    let features = FeatureVector::from([0.0; 8]);

    for expected in 0..5 {
        let outcome = step.infer(&features).await.unwrap();
        assert_eq!(outcome.sequence_position, expected);
    }
    assert_eq!(step.next_position(), 5);
}

#[tokio::test]
async fn test_model_error_is_prediction_failed() {
    let step = InferenceStep::new(Arc::new(BrokenModel));

    let err = step.infer(&FeatureVector::from([0.0; 8])).await.unwrap_err();

    assert!(matches!(err, StreamError::PredictionFailed(_)));
    assert!(err.to_string().contains("model file corrupted"));
    assert_eq!(step.next_position(), 0);
}

#[tokio::test]
async fn test_unknown_label_is_prediction_failed() {
    let step = InferenceStep::new(Arc::new(FixedModel(7)));

    let result = step.infer(&FeatureVector::from([0.0; 8])).await;

    assert!(matches!(result, Err(StreamError::PredictionFailed(_))));
}

#[test]
fn test_step_reports_model_name() {
    let step = InferenceStep::new(Arc::new(LinearModel::new(vec![1.0], 0.0)));
    assert_eq!(step.model_name(), "linear");
    assert_eq!(InferenceStep::new(Arc::new(FixedModel(1))).model_name(), "model");
}
