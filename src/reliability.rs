//! Internal-consistency reliability of multi-item scales.
//!
//! Each scale is analyzed on its own complete cases, independent of the
//! global listwise deletion the composer applies later.

use ndarray::{Array2, Axis};
use tracing::{info, warn};

use crate::config::ScaleDefinition;
use crate::dataset::Table;
use crate::stats::correlation_matrix;
use crate::utils::{sample_variance, PipelineError};

/// Minimum number of complete rows before alpha is computed
pub const MIN_VALID_ROWS: usize = 10;

/// Cronbach's alpha and mean inter-item correlation of one item set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReliabilityResult {
    /// `None` when the sample is too small or the total score has no variance
    pub alpha: Option<f64>,
    pub mean_inter_item_correlation: f64,
    pub n_valid: usize,
}

impl ReliabilityResult {
    fn degraded(n_valid: usize) -> Self {
        Self {
            alpha: None,
            mean_inter_item_correlation: 0.0,
            n_valid,
        }
    }
}

/// One row of the reliability summary
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleReliability {
    pub scale: String,
    pub items: Vec<String>,
    pub result: ReliabilityResult,
}

impl ScaleReliability {
    pub fn n_items(&self) -> usize {
        self.items.len()
    }
}

/// Reliability results for every configured scale, in configuration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReliabilityReport {
    pub scales: Vec<ScaleReliability>,
}

impl ReliabilityReport {
    pub fn get(&self, scale: &str) -> Option<&ScaleReliability> {
        self.scales.iter().find(|s| s.scale == scale)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReliabilityAnalyzer {
    min_rows: usize,
}

impl Default for ReliabilityAnalyzer {
    fn default() -> Self {
        Self::new(MIN_VALID_ROWS)
    }
}

impl ReliabilityAnalyzer {
    pub fn new(min_rows: usize) -> Self {
        Self { min_rows }
    }

    /// Compute Cronbach's alpha over the rows where every item is present
    ///
    /// # Returns
    /// * `Ok(ReliabilityResult)` - possibly degraded (`alpha = None`) when
    ///   the sample is too small or the summed score is constant
    /// * `Err(PipelineError::SchemaError)` - if an item column is absent
    pub fn compute_alpha(
        &self,
        table: &Table,
        item_columns: &[String],
    ) -> Result<ReliabilityResult, PipelineError> {
        let items = complete_cases(table, item_columns)?;
        let (n_valid, n_items) = items.dim();

        if n_valid < self.min_rows || n_items < 2 {
            return Ok(ReliabilityResult::degraded(n_valid));
        }

        let item_var_sum: f64 = items
            .columns()
            .into_iter()
            .filter_map(sample_variance)
            .sum();
        let totals = items.sum_axis(Axis(1));
        let total_var = sample_variance(totals.view()).unwrap_or(0.0);

        if total_var == 0.0 {
            return Ok(ReliabilityResult::degraded(n_valid));
        }

        let k = n_items as f64;
        let alpha = (k / (k - 1.0)) * (1.0 - item_var_sum / total_var);

        // Undefined correlations add nothing to the matrix sum.
        let corr_sum: f64 = correlation_matrix(items.view()).iter().flatten().sum();
        let mean_corr = (corr_sum - k) / (k * (k - 1.0));

        Ok(ReliabilityResult {
            alpha: Some(alpha),
            mean_inter_item_correlation: mean_corr,
            n_valid,
        })
    }

    /// Run `compute_alpha` for every scale
    pub fn analyze_scales(
        &self,
        table: &Table,
        scales: &[ScaleDefinition],
    ) -> Result<ReliabilityReport, PipelineError> {
        let mut report = ReliabilityReport::default();
        for scale in scales {
            let result = self.compute_alpha(table, &scale.items)?;
            match result.alpha {
                Some(alpha) => info!(
                    scale = %scale.name,
                    n = result.n_valid,
                    alpha,
                    mean_r = result.mean_inter_item_correlation,
                    "scale reliability"
                ),
                None => warn!(
                    scale = %scale.name,
                    n = result.n_valid,
                    "alpha undefined (too few complete rows or no total variance)"
                ),
            }
            report.scales.push(ScaleReliability {
                scale: scale.name.clone(),
                items: scale.items.clone(),
                result,
            });
        }
        Ok(report)
    }
}

/// Cronbach's alpha with the default minimum sample size
pub fn compute_alpha(
    table: &Table,
    item_columns: &[String],
) -> Result<ReliabilityResult, PipelineError> {
    ReliabilityAnalyzer::default().compute_alpha(table, item_columns)
}

/// Numeric matrix of the rows where every listed column is present
fn complete_cases(table: &Table, columns: &[String]) -> Result<Array2<f64>, PipelineError> {
    let numeric = columns
        .iter()
        .map(|name| table.numeric(name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut flat = Vec::with_capacity(table.len() * columns.len());
    let mut rows = 0;
    for row in 0..table.len() {
        let values: Option<Vec<f64>> = numeric.iter().map(|col| col[row]).collect();
        if let Some(values) = values {
            flat.extend(values);
            rows += 1;
        }
    }

    Array2::from_shape_vec((rows, columns.len()), flat)
        .map_err(|e| PipelineError::ValidationError(format!("failed to build item matrix: {}", e)))
}
