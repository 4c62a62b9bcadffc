//! Raw survey export loading and snapshot conversion.

use encoding_rs::{Encoding, UTF_8};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::arrow_handler::{read_snapshot, write_snapshot};
use crate::dataset::Table;
use crate::utils::PipelineError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode raw bytes with a WHATWG encoding label
///
/// Malformed input is an error rather than being replaced, so a wrong
/// encoding never silently corrupts cell values.
pub fn decode(bytes: &[u8], label: &str, origin: &str) -> Result<String, PipelineError> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| PipelineError::ConfigError(format!("unknown text encoding '{}'", label)))?;

    let body = if encoding == UTF_8 {
        bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
    } else {
        bytes
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or_else(|| PipelineError::DecodeError {
            path: origin.to_string(),
            encoding: encoding.name().to_string(),
        })
}

/// Read a delimited file in the given encoding into a table
pub fn load_csv(path: &Path, encoding: &str) -> Result<Table, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "read raw export");
    let text = decode(&bytes, encoding, &path.display().to_string())?;
    Table::from_csv(&text)
}

/// Write a table snapshot to disk
pub fn save_snapshot(table: &Table, path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut sink = BufWriter::new(File::create(path)?);
    write_snapshot(table, &mut sink)
}

/// Read a table snapshot from disk
pub fn load_snapshot(path: &Path) -> Result<Table, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }
    read_snapshot(BufReader::new(File::open(path)?))
}

/// What a CSV-to-snapshot conversion did
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    pub rows: usize,
    pub columns: usize,
    /// Percentage of missing cells in the raw table
    pub missing_rate: f64,
    pub csv_bytes: u64,
    pub snapshot_bytes: u64,
    pub csv_load_time: Duration,
    pub snapshot_save_time: Duration,
    pub snapshot_load_time: Duration,
}

impl ConversionSummary {
    /// How many times faster the snapshot reloads than the CSV parses
    pub fn speedup(&self) -> Option<f64> {
        let reload = self.snapshot_load_time.as_secs_f64();
        (reload > 0.0).then(|| self.csv_load_time.as_secs_f64() / reload)
    }
}

/// Convert a raw CSV export into a snapshot and verify the snapshot reloads
/// to an identical table
pub fn convert(
    input: &Path,
    output: &Path,
    encoding: &str,
) -> Result<ConversionSummary, PipelineError> {
    let started = Instant::now();
    let table = load_csv(input, encoding)?;
    let csv_load_time = started.elapsed();
    info!(
        rows = table.len(),
        columns = table.num_columns(),
        "loaded raw export in {:.1}s",
        csv_load_time.as_secs_f64()
    );

    let started = Instant::now();
    save_snapshot(&table, output)?;
    let snapshot_save_time = started.elapsed();

    let started = Instant::now();
    let reloaded = load_snapshot(output)?;
    let snapshot_load_time = started.elapsed();

    if reloaded != table {
        return Err(PipelineError::ValidationError(format!(
            "snapshot {} does not reproduce the source table",
            output.display()
        )));
    }
    info!(path = %output.display(), "snapshot verified");

    Ok(ConversionSummary {
        rows: table.len(),
        columns: table.num_columns(),
        missing_rate: table.missing_rate(),
        csv_bytes: fs::metadata(input)?.len(),
        snapshot_bytes: fs::metadata(output)?.len(),
        csv_load_time,
        snapshot_save_time,
        snapshot_load_time,
    })
}
