use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use std::io::Write;
use std::sync::Arc;

use crate::dataset::{ColumnData, Table};
use crate::utils::PipelineError;

/// Arrow type used to store each column type
pub(crate) fn arrow_type(data: &ColumnData) -> DataType {
    match data {
        ColumnData::Int64(_) => DataType::Int64,
        ColumnData::Float64(_) => DataType::Float64,
        ColumnData::Utf8(_) => DataType::Utf8,
    }
}

/// Build the Arrow schema of a table: one nullable field per column
pub fn table_schema(table: &Table) -> Arc<Schema> {
    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|c| Field::new(c.name.as_str(), arrow_type(&c.data), true))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Convert a table into a single record batch
///
/// # Returns
/// * `Ok(RecordBatch)` - Batch with the table's columns in order
/// * `Err(PipelineError)` - If the table has no columns or batch creation fails
pub fn build_record_batch(table: &Table) -> Result<RecordBatch, PipelineError> {
    if table.num_columns() == 0 {
        return Err(PipelineError::ValidationError(
            "table has no columns".to_string(),
        ));
    }

    let schema = table_schema(table);
    let arrays: Vec<ArrayRef> = table
        .columns()
        .iter()
        .map(|c| match &c.data {
            ColumnData::Int64(v) => Arc::new(Int64Array::from(v.clone())) as ArrayRef,
            ColumnData::Float64(v) => Arc::new(Float64Array::from(v.clone())) as ArrayRef,
            ColumnData::Utf8(v) => Arc::new(StringArray::from(v.clone())) as ArrayRef,
        })
        .collect();

    RecordBatch::try_new(schema, arrays)
        .map_err(|e| PipelineError::ArrowError(format!("failed to create RecordBatch: {}", e)))
}

/// Serialize a table to Arrow IPC Stream format
pub fn write_snapshot<W: Write>(table: &Table, sink: &mut W) -> Result<(), PipelineError> {
    let batch = build_record_batch(table)?;
    let schema = batch.schema();
    {
        let mut writer = StreamWriter::try_new(&mut *sink, &schema).map_err(|e| {
            PipelineError::ArrowError(format!("failed to create StreamWriter: {}", e))
        })?;
        writer
            .write(&batch)
            .map_err(|e| PipelineError::ArrowError(format!("failed to write batch: {}", e)))?;
        writer
            .finish()
            .map_err(|e| PipelineError::ArrowError(format!("failed to finish writer: {}", e)))?;
    }
    sink.flush()?;
    Ok(())
}

/// Serialize a table to an in-memory Arrow IPC Stream buffer
pub fn snapshot_bytes(table: &Table) -> Result<Vec<u8>, PipelineError> {
    let mut buffer = Vec::new();
    write_snapshot(table, &mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::ipc::reader::StreamReader;
    use std::io::Cursor;

    #[test]
    fn test_snapshot_schema() {
        let table = Table::from_csv("id,score,city\n1,2.5,서울\n2,,").unwrap();
        let bytes = snapshot_bytes(&table).unwrap();
        assert!(!bytes.is_empty());

        // Verify by parsing back
        let reader = StreamReader::try_new(Cursor::new(bytes), None).unwrap();
        let schema = reader.schema();
        assert_eq!(schema.fields().len(), 3);
        assert_eq!(schema.field(0).name(), "id");
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert_eq!(schema.field(2).data_type(), &DataType::Utf8);
        assert!(schema.field(1).is_nullable());
    }

    #[test]
    fn test_build_record_batch_nulls() {
        let table = Table::from_csv("a,b\n1,\n,x").unwrap();
        let batch = build_record_batch(&table).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.column(0).null_count(), 1);
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn test_build_record_batch_empty() {
        let result = build_record_batch(&Table::new());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("no columns"));
    }
}
