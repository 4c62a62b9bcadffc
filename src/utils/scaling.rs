use ndarray::{Array1, ArrayView1};

use crate::utils::PipelineError;

/// Arithmetic mean of a column, computed in two passes
///
/// The second pass adds the mean of the residuals, which removes most of the
/// rounding error the naive sum picks up on long columns.
///
/// # Returns
/// * `Ok(mean)` - Mean of the values
/// * `Err(PipelineError)` - If the column is empty
pub fn stable_mean(values: ArrayView1<f64>) -> Result<f64, PipelineError> {
    if values.is_empty() {
        return Err(PipelineError::ValidationError(
            "cannot take the mean of an empty column".to_string(),
        ));
    }
    let n = values.len() as f64;
    let first = values.sum() / n;
    let correction = values.iter().map(|v| v - first).sum::<f64>() / n;
    Ok(first + correction)
}

/// Subtract the column mean from every value
///
/// # Returns
/// * `Ok((centered, mean))` - Centered column and the mean that was removed
/// * `Err(PipelineError)` - If the column is empty
pub fn mean_center(values: ArrayView1<f64>) -> Result<(Array1<f64>, f64), PipelineError> {
    let mean = stable_mean(values)?;
    Ok((values.mapv(|v| v - mean), mean))
}

/// Sample variance (denominator n - 1), two-pass
///
/// Returns `None` when fewer than two values are present.
pub fn sample_variance(values: ArrayView1<f64>) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = stable_mean(values).ok()?;
    let (ss, comp) = values.iter().fold((0.0, 0.0), |(ss, comp), &v| {
        let d = v - mean;
        (ss + d * d, comp + d)
    });
    Some((ss - comp * comp / n as f64) / (n - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_stable_mean() {
        let values = arr1(&[1.0, 2.0, 3.0, 4.0]);
        assert!((stable_mean(values.view()).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_stable_mean_empty() {
        let values = Array1::<f64>::zeros(0);
        assert!(stable_mean(values.view()).is_err());
    }

    #[test]
    fn test_mean_center_normal() {
        let values = arr1(&[2.0, 4.0, 6.0]);
        let (centered, mean) = mean_center(values.view()).unwrap();

        assert!((mean - 4.0).abs() < 1e-12);
        assert!((centered[0] + 2.0).abs() < 1e-12);
        assert!(centered[1].abs() < 1e-12);
        assert!((centered[2] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_center_constant_column() {
        let values = arr1(&[5.0, 5.0, 5.0]);
        let (centered, mean) = mean_center(values.view()).unwrap();
        assert_eq!(mean, 5.0);
        assert!(centered.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_sample_variance() {
        // mean 5, squared deviations sum to 32, n - 1 = 7
        let values = arr1(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let var = sample_variance(values.view()).unwrap();
        assert!((var - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_variance_too_short() {
        assert!(sample_variance(arr1(&[1.0]).view()).is_none());
        assert_eq!(sample_variance(arr1(&[3.0, 3.0]).view()), Some(0.0));
    }
}
