use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::features::{FeatureVector, FEATURE_COUNT};

/// Column-wise standardization fitted on training rows. Constant columns keep
/// a unit scale so they map to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Learns column means and population standard deviations.
    #[must_use]
    pub fn fit(rows: &Array2<f64>) -> Self {
        let width = rows.ncols();
        let mean = rows
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(width));
        let scale = rows
            .std_axis(Axis(0), 0.0)
            .mapv(|std| if std > 1e-12 { std } else { 1.0 });
        Self { mean, scale }
    }

    /// Number of columns the scaler was fitted on.
    #[must_use]
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Standardizes a matrix.
    #[must_use]
    pub fn transform(&self, rows: &Array2<f64>) -> Array2<f64> {
        (rows - &self.mean) / &self.scale
    }

    /// Standardizes one feature vector.
    #[must_use]
    pub fn transform_vector(&self, vector: &FeatureVector) -> Array1<f64> {
        (&Array1::from(vector.as_slice().to_vec()) - &self.mean) / &self.scale
    }
}

/// Stacks feature vectors into a row matrix.
#[must_use]
pub fn to_matrix(vectors: &[FeatureVector]) -> Array2<f64> {
    let mut rows = Array2::zeros((vectors.len(), FEATURE_COUNT));
    for (mut row, vector) in rows.outer_iter_mut().zip(vectors) {
        row.assign(&Array1::from(vector.as_slice().to_vec()));
    }
    rows
}
