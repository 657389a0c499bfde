use serde::{Deserialize, Serialize};

/// Held-out metrics of a regression unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean squared error.
    pub mse: f64,
    /// Coefficient of determination.
    pub r2: f64,
}

impl RegressionMetrics {
    /// Reported when a unit fails to train.
    pub const SENTINEL: Self = Self { mse: 999.0, r2: 0.0 };

    /// True for the failure sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    /// Renders a concise summary string.
    #[must_use]
    pub fn summary(&self, model: &str) -> String {
        format!("[ML] model={model} mse={:.4} r2={:.4}", self.mse, self.r2)
    }
}

/// Training metrics of the anomaly unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyMetrics {
    /// Fraction of training rows flagged as outliers.
    pub anomaly_rate: f64,
}

impl AnomalyMetrics {
    /// Reported when the unit fails to train.
    pub const SENTINEL: Self = Self { anomaly_rate: 0.0 };

    /// Renders a concise summary string.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("[ML] model=anomaly_detector anomaly_rate={:.2}%", self.anomaly_rate * 100.0)
    }
}
