use std::path::Path;

use ndarray::{Array1, Array2};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{
    read_json, scaler::to_matrix, scaler::StandardScaler, unit_paths, write_json, ModelKind,
    ModelSettings, PredictionMethod, PredictiveModel,
};
use crate::{
    error::ModelError,
    features::{FeatureVector, FEATURE_COUNT},
};

/// Linear regression model with bias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    weights: Array1<f64>,
    bias: f64,
}

impl LinearRegressor {
    /// Creates a model with small random weights.
    #[must_use]
    pub fn new(feature_dim: usize, rng: &mut SmallRng) -> Self {
        Self {
            weights: (0..feature_dim)
                .map(|_| rng.gen_range(-0.05..0.05))
                .collect(),
            bias: rng.gen_range(-0.05..0.05),
        }
    }

    /// Number of input features.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    /// Predicts a batch of standardized rows.
    #[must_use]
    pub fn predict(&self, rows: &Array2<f64>) -> Array1<f64> {
        rows.dot(&self.weights) + self.bias
    }

    /// Predicts one standardized row.
    #[must_use]
    pub fn predict_one(&self, row: &Array1<f64>) -> f64 {
        row.dot(&self.weights) + self.bias
    }

    /// Full-batch gradient descent; returns the training MSE.
    pub fn fit(&mut self, rows: &Array2<f64>, labels: &Array1<f64>, lr: f64, epochs: usize) -> f64 {
        if rows.nrows() == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = rows.nrows() as f64;
        for _ in 0..epochs {
            let error = self.predict(rows) - labels;
            let grad = rows.t().dot(&error) / n;
            self.weights.scaled_add(-lr, &grad);
            self.bias -= lr * error.sum() / n;
        }
        let error = self.predict(rows) - labels;
        error.mapv(|e| e * e).sum() / n
    }

    fn is_finite(&self) -> bool {
        self.bias.is_finite() && self.weights.iter().all(|w| w.is_finite())
    }
}

#[derive(Debug, Clone)]
struct FittedLinear {
    scaler: StandardScaler,
    model: LinearRegressor,
}

/// Trainable regression unit: standard scaler feeding a linear regressor.
/// Outputs are clamped to the kind's valid range.
#[derive(Debug, Clone)]
pub struct LinearUnit {
    kind: ModelKind,
    learning_rate: f64,
    epochs: usize,
    seed: u64,
    fitted: Option<FittedLinear>,
}

impl LinearUnit {
    /// Creates an unfitted unit.
    #[must_use]
    pub fn new(kind: ModelKind, settings: &ModelSettings) -> Self {
        Self {
            kind,
            learning_rate: settings.learning_rate,
            epochs: settings.epochs,
            seed: settings.seed,
            fitted: None,
        }
    }

    fn fitted(&self) -> Result<&FittedLinear, ModelError> {
        self.fitted
            .as_ref()
            .ok_or_else(|| ModelError::NotFitted(self.kind.name().to_string()))
    }
}

impl PredictiveModel for LinearUnit {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn method(&self) -> PredictionMethod {
        PredictionMethod::Trained
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn fit(&mut self, features: &[FeatureVector], targets: &[f64]) -> Result<(), ModelError> {
        if features.len() != targets.len() {
            return Err(ModelError::LengthMismatch {
                features: features.len(),
                targets: targets.len(),
            });
        }
        if features.is_empty() {
            return Err(ModelError::InsufficientSamples {
                model: self.kind.name().to_string(),
                needed: 1,
                got: 0,
            });
        }
        let rows = to_matrix(features);
        let scaler = StandardScaler::fit(&rows);
        let scaled = scaler.transform(&rows);
        let labels = Array1::from(targets.to_vec());
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut model = LinearRegressor::new(FEATURE_COUNT, &mut rng);
        let mse = model.fit(&scaled, &labels, self.learning_rate, self.epochs);
        if !mse.is_finite() || !model.is_finite() {
            return Err(ModelError::Diverged(self.kind.name().to_string()));
        }
        self.fitted = Some(FittedLinear { scaler, model });
        Ok(())
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let fitted = self.fitted()?;
        let row = fitted.scaler.transform_vector(features);
        let (low, high) = self.kind.bounds();
        Ok(fitted.model.predict_one(&row).clamp(low, high))
    }

    fn persist(&self, dir: &Path) -> Result<(), ModelError> {
        let fitted = self.fitted()?;
        let (model_path, scaler_path) = unit_paths(dir, self.kind);
        write_json(&model_path, &fitted.model)?;
        write_json(&scaler_path, &fitted.scaler)
    }

    fn load(&mut self, dir: &Path) -> Result<bool, ModelError> {
        let (model_path, scaler_path) = unit_paths(dir, self.kind);
        if !model_path.exists() || !scaler_path.exists() {
            return Ok(false);
        }
        let model: LinearRegressor = read_json(&model_path)?;
        let scaler: StandardScaler = read_json(&scaler_path)?;
        for width in [model.dim(), scaler.width()] {
            if width != FEATURE_COUNT {
                return Err(ModelError::DimensionMismatch {
                    expected: FEATURE_COUNT,
                    got: width,
                });
            }
        }
        self.fitted = Some(FittedLinear { scaler, model });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::DEFAULT_FEATURES;
    use tempfile::tempdir;

    fn samples() -> (Vec<FeatureVector>, Vec<f64>) {
        (0..40)
            .map(|idx| {
                let x = f64::from(idx);
                let mut values = DEFAULT_FEATURES;
                values[0] = 10.0 + x * 0.5;
                values[8] = 20.0 + x;
                (FeatureVector::from_values(values), 0.1 + 0.01 * x)
            })
            .unzip()
    }

    #[test]
    fn linear_model_training_reduces_error() {
        let (features, targets) = samples();
        let rows = to_matrix(&features);
        let scaled = StandardScaler::fit(&rows).transform(&rows);
        let labels = Array1::from(targets);
        let mut rng = SmallRng::seed_from_u64(7);
        let mut model = LinearRegressor::new(FEATURE_COUNT, &mut rng);
        let early = model.clone().fit(&scaled, &labels, 0.05, 1);
        let late = model.fit(&scaled, &labels, 0.05, 400);
        assert!(late < early);
        assert!(late < 1e-4);
    }

    #[test]
    fn unit_predicts_within_bounds_and_round_trips() {
        let settings = ModelSettings::default();
        let (features, targets) = samples();
        let mut unit = LinearUnit::new(ModelKind::Threat, &settings);
        assert!(matches!(
            unit.predict(&features[0]),
            Err(ModelError::NotFitted(_))
        ));
        unit.fit(&features, &targets).unwrap();
        let prediction = unit.predict(&features[10]).unwrap();
        assert!((0.0..=1.0).contains(&prediction));
        assert!((prediction - targets[10]).abs() < 0.05);

        let dir = tempdir().unwrap();
        unit.persist(dir.path()).unwrap();
        assert!(dir.path().join("threat_predictor.json").exists());
        assert!(dir.path().join("threat_predictor_scaler.json").exists());

        let mut restored = LinearUnit::new(ModelKind::Threat, &settings);
        assert!(restored.load(dir.path()).unwrap());
        assert!((restored.predict(&features[10]).unwrap() - prediction).abs() < 1e-12);
    }

    #[test]
    fn fit_rejects_bad_batches() {
        let mut unit = LinearUnit::new(ModelKind::Growth, &ModelSettings::default());
        assert!(matches!(
            unit.fit(&[], &[]),
            Err(ModelError::InsufficientSamples { .. })
        ));
        let (features, _) = samples();
        assert!(matches!(
            unit.fit(&features, &[0.1]),
            Err(ModelError::LengthMismatch { .. })
        ));
        let dir = tempdir().unwrap();
        assert!(!unit.load(dir.path()).unwrap());
    }
}
