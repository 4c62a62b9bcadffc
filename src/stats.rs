use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::utils::{sample_variance, stable_mean};

/// Summary statistics for one numeric variable
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub field: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; undefined for fewer than two values
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Statistics {
    /// Compute statistics for a column of values
    ///
    /// Returns `None` for an empty column.
    pub fn compute(field: &str, values: ArrayView1<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        Some(Statistics {
            field: field.to_string(),
            count: values.len(),
            mean: stable_mean(values).ok()?,
            std: sample_variance(values).map(f64::sqrt),
            min: sorted[0],
            q25: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q75: quantile_sorted(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Quantile of already-sorted values with linear interpolation between
/// the two closest ranks
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Pearson correlation of two equal-length columns
///
/// `None` when either column has no variance or fewer than two values.
pub fn pearson(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = stable_mean(x).ok()?;
    let my = stable_mean(y).ok()?;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y.iter()) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let divisor = (sxx * syy).sqrt();
    if divisor == 0.0 {
        return None;
    }
    Some((sxy / divisor).clamp(-1.0, 1.0))
}

/// Pairwise Pearson correlations between the columns of `data`
pub fn correlation_matrix(data: ArrayView2<f64>) -> Array2<Option<f64>> {
    let k = data.ncols();
    let mut matrix = Array2::from_elem((k, k), None);
    for i in 0..k {
        for j in i..k {
            let r = pearson(data.column(i), data.column(j));
            matrix[[i, j]] = r;
            matrix[[j, i]] = r;
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_statistics_compute() {
        let values = arr1(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let stats = Statistics::compute("value", values.view()).unwrap();

        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean, 30.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.q25, 20.0);
        assert_eq!(stats.median, 30.0);
        assert_eq!(stats.q75, 40.0);
        assert_eq!(stats.max, 50.0);
        // sample variance = 1000 / 4
        assert!((stats.std.unwrap() - 250f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_statistics_empty() {
        let values = arr1::<f64>(&[]);
        assert!(Statistics::compute("value", values.view()).is_none());
    }

    #[test]
    fn test_statistics_single_value_has_no_std() {
        let values = arr1(&[3.0]);
        let stats = Statistics::compute("value", values.view()).unwrap();
        assert!(stats.std.is_none());
        assert_eq!(stats.median, 3.0);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile_sorted(&sorted, 0.25) - 1.75).abs() < 1e-12);
        assert!((quantile_sorted(&sorted, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile_sorted(&sorted, 0.75) - 3.25).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_perfect() {
        let x = arr1(&[1.0, 2.0, 3.0, 4.0]);
        let y = arr1(&[2.0, 4.0, 6.0, 8.0]);
        let z = arr1(&[8.0, 6.0, 4.0, 2.0]);
        assert!((pearson(x.view(), y.view()).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(x.view(), z.view()).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_constant_is_undefined() {
        let x = arr1(&[1.0, 2.0, 3.0]);
        let c = arr1(&[5.0, 5.0, 5.0]);
        assert!(pearson(x.view(), c.view()).is_none());
    }

    #[test]
    fn test_correlation_matrix_symmetric() {
        let data = arr2(&[[1.0, 3.0, 5.0], [2.0, 1.0, 5.0], [3.0, 2.0, 5.0], [4.0, 4.0, 5.0]]);
        let matrix = correlation_matrix(data.view());

        assert_eq!(matrix.dim(), (3, 3));
        assert!((matrix[[0, 0]].unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(matrix[[0, 1]], matrix[[1, 0]]);
        assert!(matrix[[2, 2]].is_none());
        assert!(matrix[[0, 2]].is_none());
    }
}
