use std::path::Path;

use super::{simulate::SimulationTables, ModelKind, PredictionMethod, PredictiveModel};
use crate::{
    asset::{AssetType, Priority},
    error::ModelError,
    features::{FeatureTables, FeatureVector},
};

/// Deterministic fallback unit evaluating the noise-free simulation formulas.
/// The asset type and priority are decoded from the type and priority codes.
#[derive(Debug, Clone)]
pub struct FormulaModel {
    kind: ModelKind,
    tables: SimulationTables,
    features: FeatureTables,
}

impl FormulaModel {
    /// Creates a formula unit.
    #[must_use]
    pub const fn new(
        kind: ModelKind,
        tables: SimulationTables,
        features: FeatureTables,
    ) -> Self {
        Self {
            kind,
            tables,
            features,
        }
    }

    fn decode_type(&self, code: f64) -> AssetType {
        self.features
            .type_for_score(code)
            .cloned()
            .unwrap_or_else(|| AssetType::Other(String::new()))
    }

    /// Infallible evaluation.
    #[must_use]
    pub fn evaluate(&self, features: &FeatureVector) -> f64 {
        let priority = Priority::from_score(features.priority_score());
        match self.kind {
            ModelKind::Growth => self
                .tables
                .expected_growth_rate(&self.decode_type(features.type_score()), priority),
            ModelKind::Threat => self.tables.expected_threat_score(priority, features),
            ModelKind::Anomaly => 0.0,
        }
    }
}

impl PredictiveModel for FormulaModel {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn method(&self) -> PredictionMethod {
        PredictionMethod::Formula
    }

    fn is_fitted(&self) -> bool {
        true
    }

    fn fit(&mut self, features: &[FeatureVector], targets: &[f64]) -> Result<(), ModelError> {
        if self.kind != ModelKind::Anomaly && features.len() != targets.len() {
            return Err(ModelError::LengthMismatch {
                features: features.len(),
                targets: targets.len(),
            });
        }
        Ok(())
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(self.evaluate(features))
    }

    fn persist(&self, _dir: &Path) -> Result<(), ModelError> {
        Ok(())
    }

    fn load(&mut self, _dir: &Path) -> Result<bool, ModelError> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::DEFAULT_FEATURES;

    fn unit(kind: ModelKind) -> FormulaModel {
        FormulaModel::new(
            kind,
            SimulationTables::default(),
            FeatureTables::default(),
        )
    }

    #[test]
    fn growth_formula_decodes_type_and_priority() {
        let mut values = DEFAULT_FEATURES;
        values[3] = 3.0;
        values[4] = 2.0;
        let airport_high = FeatureVector::from_values(values);
        let rate = unit(ModelKind::Growth).evaluate(&airport_high);
        assert!((rate - 0.075).abs() < 1e-12);

        values[4] = 0.0;
        let other_low = FeatureVector::from_values({
            let mut v = values;
            v[3] = 1.0;
            v
        });
        assert!((unit(ModelKind::Growth).evaluate(&other_low) - 0.02).abs() < 1e-12);
    }

    #[test]
    fn anomaly_formula_is_neutral() {
        let model = unit(ModelKind::Anomaly);
        assert!(model.predict(&FeatureVector::fallback()).unwrap().abs() < f64::EPSILON);
        assert!(model.is_fitted());
        assert_eq!(model.method(), PredictionMethod::Formula);
    }
}
