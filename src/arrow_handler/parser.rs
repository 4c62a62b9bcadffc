use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Schema};
use arrow::ipc::reader::StreamReader;
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::dataset::{Column, ColumnData, Table};
use crate::utils::PipelineError;

/// Read a table back from Arrow IPC Stream format
///
/// Batches are concatenated in order. Only the column types the loader
/// writes (Int64, Float64, Utf8) are accepted.
///
/// # Returns
/// * `Ok(Table)` with the snapshot's columns, types and nulls
/// * `Err(PipelineError)` if parsing fails or the schema holds another type
pub fn read_snapshot<R: Read>(source: R) -> Result<Table, PipelineError> {
    let reader = StreamReader::try_new(source, None)
        .map_err(|e| PipelineError::ArrowError(format!("failed to create StreamReader: {}", e)))?;
    let schema = reader.schema();
    validate_schema(&schema)?;

    let mut columns: Vec<ColumnData> = schema
        .fields()
        .iter()
        .map(|f| match f.data_type() {
            DataType::Int64 => ColumnData::Int64(Vec::new()),
            DataType::Float64 => ColumnData::Float64(Vec::new()),
            _ => ColumnData::Utf8(Vec::new()),
        })
        .collect();

    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| PipelineError::ArrowError(format!("failed to read batch: {}", e)))?;
        for (data, array) in columns.iter_mut().zip(batch.columns()) {
            append_array(data, array)?;
        }
    }

    let columns = schema
        .fields()
        .iter()
        .zip(columns)
        .map(|(field, data)| Column::new(field.name().as_str(), data))
        .collect();
    Table::from_columns(columns)
}

/// Read a table from an in-memory Arrow IPC Stream buffer
pub fn parse_snapshot(data: &[u8]) -> Result<Table, PipelineError> {
    if data.is_empty() {
        return Err(PipelineError::ArrowError("empty input data".to_string()));
    }
    read_snapshot(Cursor::new(data))
}

fn validate_schema(schema: &Arc<Schema>) -> Result<(), PipelineError> {
    if schema.fields().is_empty() {
        return Err(PipelineError::ArrowError("schema has no fields".to_string()));
    }
    for (idx, field) in schema.fields().iter().enumerate() {
        if !matches!(
            field.data_type(),
            DataType::Int64 | DataType::Float64 | DataType::Utf8
        ) {
            return Err(PipelineError::ArrowError(format!(
                "column '{}' at index {} has unsupported type {:?}",
                field.name(),
                idx,
                field.data_type()
            )));
        }
    }
    Ok(())
}

fn append_array(data: &mut ColumnData, array: &ArrayRef) -> Result<(), PipelineError> {
    let mismatch =
        || PipelineError::ArrowError("column array does not match schema type".to_string());
    match data {
        ColumnData::Int64(cells) => {
            let arr = array
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(mismatch)?;
            cells.extend(arr.iter());
        }
        ColumnData::Float64(cells) => {
            let arr = array
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(mismatch)?;
            cells.extend(arr.iter());
        }
        ColumnData::Utf8(cells) => {
            let arr = array
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(mismatch)?;
            cells.extend(arr.iter().map(|s| s.map(str::to_string)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrow_handler::builder::snapshot_bytes;
    use arrow::array::BooleanArray;
    use arrow::datatypes::Field;
    use arrow::ipc::writer::StreamWriter;
    use arrow::record_batch::RecordBatch;

    #[test]
    fn test_snapshot_round_trip() {
        let csv = "id,w,ratio,city\n1,8,0.5,서울\n2,,1.25,\n3,9,,부산";
        let table = Table::from_csv(csv).unwrap();
        let bytes = snapshot_bytes(&table).unwrap();

        let restored = parse_snapshot(&bytes).unwrap();
        assert_eq!(restored, table);
        assert_eq!(restored.column_names(), vec!["id", "w", "ratio", "city"]);
        assert_eq!(restored.numeric("w").unwrap(), vec![Some(8.0), None, Some(9.0)]);
    }

    #[test]
    fn test_parse_snapshot_empty() {
        let result = parse_snapshot(&[]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty input"));
    }

    #[test]
    fn test_parse_snapshot_garbage() {
        let result = parse_snapshot(&[1u8, 2, 3]);
        assert!(matches!(result, Err(PipelineError::ArrowError(_))));
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let schema = Arc::new(Schema::new(vec![Field::new("flag", DataType::Boolean, true)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(BooleanArray::from(vec![Some(true)])) as ArrayRef],
        )
        .unwrap();
        let mut buffer = Vec::new();
        {
            let mut writer = StreamWriter::try_new(&mut buffer, &schema).unwrap();
            writer.write(&batch).unwrap();
            writer.finish().unwrap();
        }

        let result = parse_snapshot(&buffer);
        assert!(result.unwrap_err().to_string().contains("unsupported type"));
    }
}
