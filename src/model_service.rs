use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

pub const TUMOR_DETECTED: &str = "Tumor Detected";
pub const NO_TUMOR_DETECTED: &str = "No Tumor Detected";

#[derive(Error, Debug)]
pub enum ModelServiceError {
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model returned no scalar output")]
    MissingScalarOutput,
}

/// Seam between the HTTP layer and the inference runtime. Implementations
/// must be safe for concurrent calls from simultaneously handled requests.
pub trait ModelService: Send + Sync + 'static {
    /// Runs the classifier on raw image bytes and returns the tumor
    /// probability in [0, 1].
    fn predict(&self, image_data: &[u8]) -> Result<f32, ModelServiceError>;
}

/// Set once at startup and read-only afterwards. `Unavailable` keeps the
/// server answering requests when the artifact failed to load.
pub enum ModelState {
    Ready(Arc<dyn ModelService>),
    Unavailable(String),
}

#[derive(Debug, Serialize)]
pub struct TumorPrediction {
    pub prediction: String,
    pub probability: f32,
}

impl TumorPrediction {
    /// Strict greater-than: exactly 0.5 classifies as no tumor.
    pub fn from_probability(probability: f32) -> Self {
        let prediction = if probability > 0.5 {
            TUMOR_DETECTED
        } else {
            NO_TUMOR_DETECTED
        };

        Self {
            prediction: prediction.to_string(),
            probability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_above_threshold_detects_tumor() {
        let result = TumorPrediction::from_probability(0.73);

        assert_eq!(result.prediction, TUMOR_DETECTED);
        assert_eq!(result.probability, 0.73);
    }

    #[test]
    fn probability_at_threshold_detects_no_tumor() {
        let result = TumorPrediction::from_probability(0.5);

        assert_eq!(result.prediction, NO_TUMOR_DETECTED);
    }

    #[test]
    fn low_probability_detects_no_tumor() {
        let result = TumorPrediction::from_probability(0.2);

        assert_eq!(result.prediction, NO_TUMOR_DETECTED);
        assert_eq!(result.probability, 0.2);
    }
}
