use std::path::Path;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::{
    read_json, scaler::to_matrix, scaler::StandardScaler, unit_paths, write_json, ModelKind,
    PredictionMethod, PredictiveModel,
};
use crate::{
    error::ModelError,
    features::{FeatureVector, FEATURE_COUNT},
};

/// Cap on per-feature z-scores so one extreme column cannot dominate.
const Z_CAP: f64 = 10.0;
const MIN_THRESHOLD: f64 = 1e-6;

/// Max-|z| outlier detector. The threshold is the `1 - contamination`
/// quantile of the training scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScoreDetector {
    threshold: f64,
    contamination: f64,
}

impl ZScoreDetector {
    fn max_z(row: &Array1<f64>) -> f64 {
        row.iter()
            .map(|z| z.abs().min(Z_CAP))
            .fold(0.0, f64::max)
    }

    /// Decision score in `[-1, 1]`; negative means outlier.
    #[must_use]
    pub fn decision(&self, row: &Array1<f64>) -> f64 {
        let (low, high) = ModelKind::Anomaly.bounds();
        ((self.threshold - Self::max_z(row)) / self.threshold).clamp(low, high)
    }

    /// Score cutoff learned from training.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Outlier share the threshold was fitted for.
    #[must_use]
    pub const fn contamination(&self) -> f64 {
        self.contamination
    }
}

#[derive(Debug, Clone)]
struct FittedDetector {
    scaler: StandardScaler,
    detector: ZScoreDetector,
}

/// Trainable anomaly unit. `predict` returns the decision score.
#[derive(Debug, Clone)]
pub struct AnomalyUnit {
    contamination: f64,
    fitted: Option<FittedDetector>,
}

impl AnomalyUnit {
    /// Creates an unfitted unit expecting the given outlier share.
    #[must_use]
    pub fn new(contamination: f64) -> Self {
        Self {
            contamination: contamination.clamp(0.0, 0.5),
            fitted: None,
        }
    }

    fn fitted(&self) -> Result<&FittedDetector, ModelError> {
        self.fitted
            .as_ref()
            .ok_or_else(|| ModelError::NotFitted(ModelKind::Anomaly.name().to_string()))
    }
}

impl PredictiveModel for AnomalyUnit {
    fn kind(&self) -> ModelKind {
        ModelKind::Anomaly
    }

    fn method(&self) -> PredictionMethod {
        PredictionMethod::Trained
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn fit(&mut self, features: &[FeatureVector], _targets: &[f64]) -> Result<(), ModelError> {
        if features.is_empty() {
            return Err(ModelError::InsufficientSamples {
                model: ModelKind::Anomaly.name().to_string(),
                needed: 1,
                got: 0,
            });
        }
        let rows = to_matrix(features);
        let scaler = StandardScaler::fit(&rows);
        let scaled = scaler.transform(&rows);
        let mut scores: Vec<f64> = scaled
            .outer_iter()
            .map(|row| ZScoreDetector::max_z(&row.to_owned()))
            .collect();
        scores.sort_by(f64::total_cmp);
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let rank = ((1.0 - self.contamination) * scores.len() as f64).ceil() as usize;
        let threshold = scores[rank.clamp(1, scores.len()) - 1].max(MIN_THRESHOLD);
        self.fitted = Some(FittedDetector {
            scaler,
            detector: ZScoreDetector {
                threshold,
                contamination: self.contamination,
            },
        });
        Ok(())
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let fitted = self.fitted()?;
        Ok(fitted
            .detector
            .decision(&fitted.scaler.transform_vector(features)))
    }

    fn persist(&self, dir: &Path) -> Result<(), ModelError> {
        let fitted = self.fitted()?;
        let (model_path, scaler_path) = unit_paths(dir, ModelKind::Anomaly);
        write_json(&model_path, &fitted.detector)?;
        write_json(&scaler_path, &fitted.scaler)
    }

    fn load(&mut self, dir: &Path) -> Result<bool, ModelError> {
        let (model_path, scaler_path) = unit_paths(dir, ModelKind::Anomaly);
        if !model_path.exists() || !scaler_path.exists() {
            return Ok(false);
        }
        let detector: ZScoreDetector = read_json(&model_path)?;
        let scaler: StandardScaler = read_json(&scaler_path)?;
        if scaler.width() != FEATURE_COUNT {
            return Err(ModelError::DimensionMismatch {
                expected: FEATURE_COUNT,
                got: scaler.width(),
            });
        }
        self.fitted = Some(FittedDetector { scaler, detector });
        Ok(true)
    }
}
