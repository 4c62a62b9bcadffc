use ndarray::{Array1, Array2, ArrayView1, Axis};
use tracing::info;

use crate::config::{ScaleRole, StudyConfig};
use crate::dataset::Table;
use crate::utils::{mean_center, PipelineError};

/// Dense numeric table with named columns and no missing cells
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisFrame {
    pub names: Vec<String>,
    pub data: Array2<f64>,
}

impl AnalysisFrame {
    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>, PipelineError> {
        let idx = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| PipelineError::missing_column(name))?;
        Ok(self.data.column(idx))
    }

    /// Project onto the named columns, in the given order
    pub fn select(&self, names: &[String]) -> Result<AnalysisFrame, PipelineError> {
        let columns = names
            .iter()
            .map(|name| self.column(name))
            .collect::<Result<Vec<_>, _>>()?;
        let data = ndarray::stack(Axis(1), &columns).map_err(|e| {
            PipelineError::ValidationError(format!("failed to select columns: {}", e))
        })?;
        Ok(AnalysisFrame {
            names: names.to_vec(),
            data,
        })
    }

    fn from_columns(
        columns: Vec<(String, Array1<f64>)>,
        rows: usize,
    ) -> Result<Self, PipelineError> {
        let mut data = Array2::zeros((rows, columns.len()));
        let mut names = Vec::with_capacity(columns.len());
        for (idx, (name, values)) in columns.into_iter().enumerate() {
            if values.len() != rows {
                return Err(PipelineError::ValidationError(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    values.len(),
                    rows
                )));
            }
            data.column_mut(idx).assign(&values);
            names.push(name);
        }
        Ok(Self { names, data })
    }
}

/// Grand means removed from the independent and moderator composites
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenteringMeans {
    pub independent: f64,
    pub moderator: f64,
}

/// Everything the composer derives from the recoded table
#[derive(Debug, Clone)]
pub struct Composition {
    /// Composites, renamed controls, centered columns and the interaction
    pub cleaned: AnalysisFrame,
    /// The analysis-ready output, in fixed column order
    pub output: AnalysisFrame,
    pub means: CenteringMeans,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl Composition {
    /// Share of the input rows that survived listwise deletion, in percent
    pub fn retention(&self) -> f64 {
        if self.rows_before == 0 {
            return 0.0;
        }
        self.rows_after as f64 / self.rows_before as f64 * 100.0
    }
}

/// Build composites, centered scores and the interaction term
///
/// Rows missing any working column (scale items and controls) are dropped
/// once, up front; everything after operates on complete rows only.
pub fn compose(table: &Table, config: &StudyConfig) -> Result<Composition, PipelineError> {
    let working = config.working_columns();
    let numeric = working
        .iter()
        .map(|name| table.numeric(name))
        .collect::<Result<Vec<_>, _>>()?;

    let keep: Vec<usize> = (0..table.len())
        .filter(|&row| numeric.iter().all(|col| col[row].is_some()))
        .collect();
    let rows = keep.len();
    if rows == 0 {
        return Err(PipelineError::ValidationError(
            "no complete rows remain after listwise deletion".to_string(),
        ));
    }
    info!(
        before = table.len(),
        after = rows,
        "listwise deletion over {} working columns",
        working.len()
    );

    let kept = |name: &str| -> Result<Array1<f64>, PipelineError> {
        let idx = working
            .iter()
            .position(|w| w == name)
            .ok_or_else(|| PipelineError::missing_column(name))?;
        Ok(keep.iter().filter_map(|&row| numeric[idx][row]).collect())
    };

    let mut columns: Vec<(String, Array1<f64>)> = Vec::new();
    for scale in &config.scales {
        let mut sum = Array1::<f64>::zeros(rows);
        for item in &scale.items {
            sum += &kept(item)?;
        }
        columns.push((scale.name.clone(), sum / scale.items.len() as f64));
    }
    for control in &config.controls {
        columns.push((control.label.clone(), kept(&control.source)?));
    }

    let composite = |role: ScaleRole| -> Result<(String, Array1<f64>), PipelineError> {
        let scale = config.scale(role)?;
        let values = columns
            .iter()
            .find(|(name, _)| *name == scale.name)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| PipelineError::missing_column(&scale.name))?;
        let centered_name = scale.centered_name.clone().ok_or_else(|| {
            PipelineError::ConfigError(format!("scale '{}' has no centered_name", scale.name))
        })?;
        Ok((centered_name, values))
    };

    let (iv_name, iv) = composite(ScaleRole::Independent)?;
    let (mod_name, moderator) = composite(ScaleRole::Moderator)?;
    let (iv_centered, iv_mean) = mean_center(iv.view())?;
    let (mod_centered, mod_mean) = mean_center(moderator.view())?;
    let interaction = &iv_centered * &mod_centered;
    info!(
        independent_mean = iv_mean,
        moderator_mean = mod_mean,
        "composites centered"
    );

    columns.push((iv_name.clone(), iv_centered));
    columns.push((mod_name.clone(), mod_centered));
    columns.push((config.interaction_name.clone(), interaction));

    let cleaned = AnalysisFrame::from_columns(columns, rows)?;

    let roles = [ScaleRole::Dependent, ScaleRole::Independent, ScaleRole::Moderator];
    let output_order: Vec<String> = roles
        .iter()
        .map(|&role| config.scale(role).map(|s| s.name.clone()))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .chain([iv_name, mod_name, config.interaction_name.clone()])
        .chain(config.controls.iter().map(|c| c.label.clone()))
        .collect();
    let output = cleaned.select(&output_order)?;

    Ok(Composition {
        cleaned,
        output,
        means: CenteringMeans {
            independent: iv_mean,
            moderator: mod_mean,
        },
        rows_before: table.len(),
        rows_after: rows,
    })
}
