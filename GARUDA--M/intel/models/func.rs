use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};

/// Shuffles `0..n` with a seeded generator and splits it into train/test
/// index sets. The test share is rounded up; at least one row stays in
/// training and a single row yields an empty test set.
#[must_use]
pub fn train_test_split(n: usize, test_ratio: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut SmallRng::seed_from_u64(seed));
    let test_len = if n < 2 {
        0
    } else {
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let wanted = (n as f64 * test_ratio.clamp(0.0, 1.0)).ceil() as usize;
        wanted.clamp(1, n - 1)
    };
    let test = indices.split_off(n - test_len);
    (indices, test)
}

/// Mean squared error; 0 for empty or mismatched input.
#[must_use]
pub fn mean_squared_error(predictions: &[f64], labels: &[f64]) -> f64 {
    if predictions.is_empty() || predictions.len() != labels.len() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = predictions.len() as f64;
    predictions
        .iter()
        .zip(labels)
        .map(|(pred, label)| (pred - label).powi(2))
        .sum::<f64>()
        / n
}

/// Coefficient of determination. Constant labels give 1 on an exact fit and
/// 0 otherwise.
#[must_use]
pub fn r2_score(predictions: &[f64], labels: &[f64]) -> f64 {
    if predictions.is_empty() || predictions.len() != labels.len() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = labels.iter().sum::<f64>() / labels.len() as f64;
    let ss_res: f64 = predictions
        .iter()
        .zip(labels)
        .map(|(pred, label)| (label - pred).powi(2))
        .sum();
    let ss_tot: f64 = labels.iter().map(|label| (label - mean).powi(2)).sum();
    if ss_tot <= f64::EPSILON {
        return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_generates_partitions() {
        let (train, test) = train_test_split(10, 0.2, 42);
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
        assert_eq!(train_test_split(10, 0.2, 42), (train, test));
    }

    #[test]
    fn split_handles_tiny_batches() {
        assert_eq!(train_test_split(0, 0.2, 1), (vec![], vec![]));
        let (train, test) = train_test_split(1, 0.2, 1);
        assert_eq!((train.len(), test.len()), (1, 0));
        let (train, test) = train_test_split(3, 0.2, 1);
        assert_eq!((train.len(), test.len()), (2, 1));
    }

    #[test]
    fn metrics_handle_inputs() {
        assert!(mean_squared_error(&[1.0, 2.0], &[1.0, 1.5]) > 0.0);
        assert!((r2_score(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-12);
        assert!(r2_score(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).abs() < 1e-12);
        assert!(r2_score(&[0.5], &[0.4]).abs() < f64::EPSILON);
    }
}
