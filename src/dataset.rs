use crate::utils::{finite_or_missing, parse_integer, parse_numeric, PipelineError};

/// Storage type of a column, inferred once when the source file is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    Utf8,
}

/// Cell values of a single column; `None` marks a missing cell
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Utf8(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int64(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Int64(_) => ColumnType::Int64,
            ColumnData::Float64(_) => ColumnType::Float64,
            ColumnData::Utf8(_) => ColumnType::Utf8,
        }
    }

    /// Number of missing cells
    pub fn null_count(&self) -> usize {
        match self {
            ColumnData::Int64(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Float64(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Utf8(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    /// Coerce every cell to a number; anything non-numeric becomes `None`
    pub fn to_numeric(&self) -> Vec<Option<f64>> {
        match self {
            ColumnData::Int64(v) => v.iter().map(|c| c.map(|i| i as f64)).collect(),
            ColumnData::Float64(v) => v.iter().map(|&c| finite_or_missing(c)).collect(),
            ColumnData::Utf8(v) => v
                .iter()
                .map(|c| c.as_deref().and_then(parse_numeric))
                .collect(),
        }
    }

    /// Infer the narrowest type that holds every non-empty cell
    fn infer(raw: Vec<Option<String>>) -> Self {
        let present = || raw.iter().flatten();
        if present().all(|s| parse_integer(s).is_some()) {
            return ColumnData::Int64(
                raw.iter()
                    .map(|c| c.as_deref().and_then(parse_integer))
                    .collect(),
            );
        }
        if present().all(|s| parse_numeric(s).is_some()) {
            return ColumnData::Float64(
                raw.iter()
                    .map(|c| c.as_deref().and_then(parse_numeric))
                    .collect(),
            );
        }
        ColumnData::Utf8(raw)
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// An ordered collection of equal-length named columns, one row per respondent
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from columns, checking that every column has the same length
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, PipelineError> {
        let mut table = Table::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Append a column
    pub fn push_column(&mut self, column: Column) -> Result<(), PipelineError> {
        if self.columns.iter().any(|c| c.name == column.name) {
            return Err(PipelineError::ValidationError(format!(
                "duplicate column '{}'",
                column.name
            )));
        }
        if self.columns.is_empty() {
            self.rows = column.data.len();
        } else if column.data.len() != self.rows {
            return Err(PipelineError::ValidationError(format!(
                "column '{}' has {} rows, expected {}",
                column.name,
                column.data.len(),
                self.rows
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in source order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get a column by exact name
    pub fn column(&self, name: &str) -> Result<&Column, PipelineError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| PipelineError::missing_column(name))
    }

    /// Get a mutable column by exact name
    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column, PipelineError> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| PipelineError::missing_column(name))
    }

    /// Coerce a named column to numbers
    pub fn numeric(&self, name: &str) -> Result<Vec<Option<f64>>, PipelineError> {
        Ok(self.column(name)?.data.to_numeric())
    }

    /// Share of missing cells over the whole table, in percent
    pub fn missing_rate(&self) -> f64 {
        let cells = self.rows * self.columns.len();
        if cells == 0 {
            return 0.0;
        }
        let missing: usize = self.columns.iter().map(|c| c.data.null_count()).sum();
        missing as f64 / cells as f64 * 100.0
    }

    /// Load a table from CSV text with a header row
    ///
    /// Column types are inferred per column: integer, then float, then text.
    /// Empty cells are missing.
    pub fn from_csv(csv_data: &str) -> Result<Self, PipelineError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv_data.as_bytes());

        let headers = reader.headers()?.clone();
        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

        for result in reader.records() {
            let record = result?;
            for (i, cells) in raw.iter_mut().enumerate() {
                let cell = record.get(i).unwrap_or("");
                cells.push(if cell.trim().is_empty() {
                    None
                } else {
                    Some(cell.to_string())
                });
            }
        }

        let columns = headers
            .iter()
            .zip(raw)
            .map(|(name, cells)| Column::new(name, ColumnData::infer(cells)))
            .collect();
        Table::from_columns(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_loading_infers_types() {
        let csv_data = "id,score,city\n1,2.5,서울\n2,,부산\n3,4,";
        let table = Table::from_csv(csv_data).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names(), vec!["id", "score", "city"]);
        assert_eq!(table.column("id").unwrap().data.column_type(), ColumnType::Int64);
        assert_eq!(table.column("score").unwrap().data.column_type(), ColumnType::Float64);
        assert_eq!(table.column("city").unwrap().data.column_type(), ColumnType::Utf8);
        assert_eq!(table.numeric("score").unwrap(), vec![Some(2.5), None, Some(4.0)]);
    }

    #[test]
    fn test_to_numeric_coerces_text() {
        let data = ColumnData::Utf8(vec![Some("3".into()), Some("n/a".into()), None]);
        assert_eq!(data.to_numeric(), vec![Some(3.0), None, None]);
    }

    #[test]
    fn test_to_numeric_drops_nan() {
        let data = ColumnData::Float64(vec![Some(f64::NAN), Some(1.0)]);
        assert_eq!(data.to_numeric(), vec![None, Some(1.0)]);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let table = Table::from_csv("a\n1").unwrap();
        let err = table.column("b").unwrap_err();
        assert!(matches!(err, PipelineError::SchemaError { ref column } if column == "b"));
    }

    #[test]
    fn test_push_column_length_mismatch() {
        let mut table = Table::new();
        table
            .push_column(Column::new("a", ColumnData::Int64(vec![Some(1), Some(2)])))
            .unwrap();
        let result = table.push_column(Column::new("b", ColumnData::Int64(vec![Some(1)])));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_rate() {
        let table = Table::from_csv("a,b\n1,\n,2").unwrap();
        assert!((table.missing_rate() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_empty_column_is_int() {
        let table = Table::from_csv("a,b\n1,\n2,").unwrap();
        let b = &table.column("b").unwrap().data;
        assert_eq!(b.column_type(), ColumnType::Int64);
        assert_eq!(b.null_count(), 2);
    }
}
