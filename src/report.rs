//! Descriptive statistics, correlation matrix and the delimited outputs.
//!
//! Every file written here is UTF-8 with a byte-order mark, which is what
//! spreadsheet tools on Korean-locale Windows need to pick the right
//! encoding.

use ndarray::Array2;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::compose::AnalysisFrame;
use crate::reliability::ReliabilityReport;
use crate::stats::{correlation_matrix, Statistics};
use crate::utils::{format_optional, PipelineError};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Row labels of the descriptive table
pub const DESCRIBE_ROWS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Summary statistics for each described variable
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveTable {
    pub variables: Vec<Statistics>,
}

impl DescriptiveTable {
    /// Value of one statistic for one variable, in `DESCRIBE_ROWS` order
    pub fn value(&self, stat: usize, variable: usize) -> Option<f64> {
        let s = self.variables.get(variable)?;
        match stat {
            0 => Some(s.count as f64),
            1 => Some(s.mean),
            2 => s.std,
            3 => Some(s.min),
            4 => Some(s.q25),
            5 => Some(s.median),
            6 => Some(s.q75),
            7 => Some(s.max),
            _ => None,
        }
    }
}

/// Pairwise Pearson correlations; undefined pairs are `None`
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationTable {
    pub names: Vec<String>,
    pub values: Array2<Option<f64>>,
}

/// Descriptive statistics for the named columns of a frame
pub fn describe(frame: &AnalysisFrame, names: &[String]) -> Result<DescriptiveTable, PipelineError> {
    let variables = names
        .iter()
        .map(|name| {
            let column = frame.column(name)?;
            Statistics::compute(name, column).ok_or_else(|| {
                PipelineError::ValidationError(format!("column '{}' has no values", name))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DescriptiveTable { variables })
}

/// Correlation matrix over the named columns of a frame
pub fn correlate(frame: &AnalysisFrame, names: &[String]) -> Result<CorrelationTable, PipelineError> {
    let selected = frame.select(names)?;
    Ok(CorrelationTable {
        names: names.to_vec(),
        values: correlation_matrix(selected.data.view()),
    })
}

fn fmt3(value: Option<f64>) -> String {
    value.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "NaN".to_string())
}

fn render_grid(header: &[String], rows: Vec<(String, Vec<String>)>) -> String {
    let label_width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|(_, cells)| cells[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = format!("{:label_width$}", "");
    for (h, w) in header.iter().zip(&widths) {
        out.push_str(&format!("  {:>w$}", h, w = *w));
    }
    for (label, cells) in rows {
        out.push('\n');
        out.push_str(&format!("{:label_width$}", label));
        for (cell, w) in cells.iter().zip(&widths) {
            out.push_str(&format!("  {:>w$}", cell, w = *w));
        }
    }
    out
}

/// Text rendering of the descriptive table, rounded to three decimals
pub fn render_descriptives(table: &DescriptiveTable) -> String {
    let header: Vec<String> = table.variables.iter().map(|s| s.field.clone()).collect();
    let rows = DESCRIBE_ROWS
        .iter()
        .enumerate()
        .map(|(stat, label)| {
            let cells = (0..header.len()).map(|v| fmt3(table.value(stat, v))).collect();
            (label.to_string(), cells)
        })
        .collect();
    render_grid(&header, rows)
}

/// Text rendering of the correlation matrix, rounded to three decimals
pub fn render_correlations(table: &CorrelationTable) -> String {
    let rows = table
        .names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let cells = table.values.row(i).iter().map(|&v| fmt3(v)).collect();
            (name.clone(), cells)
        })
        .collect();
    render_grid(&table.names, rows)
}

fn bom_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>, PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(UTF8_BOM)?;
    Ok(csv::Writer::from_writer(file))
}

fn finish(mut writer: csv::Writer<BufWriter<File>>) -> Result<(), PipelineError> {
    writer.flush()?;
    Ok(())
}

/// Write a frame with a header row, one line per respondent
pub fn write_frame(frame: &AnalysisFrame, path: &Path) -> Result<(), PipelineError> {
    let mut writer = bom_writer(path)?;
    writer.write_record(&frame.names)?;
    for row in frame.data.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    finish(writer)
}

/// Write one line per scale: name, alpha, mean correlation, item count,
/// valid N and the comma-joined item list
pub fn write_reliability(report: &ReliabilityReport, path: &Path) -> Result<(), PipelineError> {
    let mut writer = bom_writer(path)?;
    writer.write_record([
        "Scale",
        "Cronbach_Alpha",
        "Mean_Inter_Item_Corr",
        "N_Items",
        "N_Valid",
        "Items",
    ])?;
    for scale in &report.scales {
        writer.write_record([
            scale.scale.clone(),
            format_optional(scale.result.alpha),
            scale.result.mean_inter_item_correlation.to_string(),
            scale.n_items().to_string(),
            scale.result.n_valid.to_string(),
            scale.items.join(", "),
        ])?;
    }
    finish(writer)
}

/// Write the descriptive table: one line per statistic, one column per variable
pub fn write_descriptives(table: &DescriptiveTable, path: &Path) -> Result<(), PipelineError> {
    let mut writer = bom_writer(path)?;
    let header = std::iter::once(String::new())
        .chain(table.variables.iter().map(|s| s.field.clone()));
    writer.write_record(header)?;
    for (stat, label) in DESCRIBE_ROWS.iter().enumerate() {
        let cells = (0..table.variables.len()).map(|v| format_optional(table.value(stat, v)));
        writer.write_record(std::iter::once(label.to_string()).chain(cells))?;
    }
    finish(writer)
}

/// Write the correlation matrix with variable names on both axes
pub fn write_correlations(table: &CorrelationTable, path: &Path) -> Result<(), PipelineError> {
    let mut writer = bom_writer(path)?;
    writer.write_record(std::iter::once(String::new()).chain(table.names.iter().cloned()))?;
    for (i, name) in table.names.iter().enumerate() {
        let cells = table.values.row(i).iter().map(|&v| format_optional(v)).collect::<Vec<_>>();
        writer.write_record(std::iter::once(name.clone()).chain(cells))?;
    }
    finish(writer)
}
