use tracing::debug;

use crate::config::MissingCodePolicy;
use crate::dataset::{ColumnData, Table};
use crate::utils::PipelineError;

/// Number of values turned into missing, per column
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecodeReport {
    pub columns: Vec<(String, usize)>,
}

impl RecodeReport {
    pub fn total(&self) -> usize {
        self.columns.iter().map(|(_, n)| n).sum()
    }
}

/// Replace sentinel codes with missing in the policy's columns
///
/// Every listed column must exist before anything is changed; a missing one
/// is a `SchemaError` and leaves the table untouched. Text cells are not
/// numbers and are never matched.
pub fn recode_missing(
    table: &mut Table,
    policy: &MissingCodePolicy,
) -> Result<RecodeReport, PipelineError> {
    for name in &policy.columns {
        table.column(name)?;
    }

    let mut report = RecodeReport::default();
    for name in &policy.columns {
        let column = table.column_mut(name)?;
        let recoded = match &mut column.data {
            ColumnData::Int64(cells) => blank_matching(cells, |&v| policy.is_sentinel(v as f64)),
            ColumnData::Float64(cells) => blank_matching(cells, |&v| policy.is_sentinel(v)),
            ColumnData::Utf8(_) => 0,
        };
        if recoded > 0 {
            debug!(column = %name, recoded, "sentinel codes recoded to missing");
        }
        report.columns.push((name.clone(), recoded));
    }
    Ok(report)
}

fn blank_matching<T>(cells: &mut [Option<T>], is_sentinel: impl Fn(&T) -> bool) -> usize {
    let mut count = 0;
    for cell in cells.iter_mut() {
        if cell.as_ref().is_some_and(&is_sentinel) {
            *cell = None;
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn policy(columns: &[&str]) -> MissingCodePolicy {
        MissingCodePolicy {
            codes: vec![8, 9],
            columns: columns.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_recode_three_rows() {
        let mut table = Table::from_csv("h1\n8\n9\n3").unwrap();
        let report = recode_missing(&mut table, &policy(&["h1"])).unwrap();

        assert_eq!(table.numeric("h1").unwrap(), vec![None, None, Some(3.0)]);
        assert_eq!(report.columns, vec![("h1".to_string(), 2)]);
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn test_other_columns_untouched() {
        let mut table = Table::from_csv("h1,gender,note\n8,9,8\n1,8,x\n9,1,9").unwrap();
        let before = table.clone();
        recode_missing(&mut table, &policy(&["h1"])).unwrap();

        assert_eq!(table.column("gender").unwrap(), before.column("gender").unwrap());
        assert_eq!(table.column("note").unwrap(), before.column("note").unwrap());
        assert_eq!(table.numeric("h1").unwrap(), vec![None, Some(1.0), None]);
    }

    #[test]
    fn test_float_column_recoded() {
        let mut table = Table::from_columns(vec![Column::new(
            "w",
            ColumnData::Float64(vec![Some(8.0), Some(8.5), Some(9.0), None]),
        )])
        .unwrap();
        recode_missing(&mut table, &policy(&["w"])).unwrap();
        assert_eq!(table.numeric("w").unwrap(), vec![None, Some(8.5), None, None]);
    }

    #[test]
    fn test_text_cells_not_matched() {
        let mut table = Table::from_csv("w\n8\nabc").unwrap();
        recode_missing(&mut table, &policy(&["w"])).unwrap();
        let column = &table.column("w").unwrap().data;
        assert_eq!(column.null_count(), 0);
    }

    #[test]
    fn test_missing_column_fails_without_mutation() {
        let mut table = Table::from_csv("h1,h2\n8,8").unwrap();
        let before = table.clone();
        let err = recode_missing(&mut table, &policy(&["h1", "h3"])).unwrap_err();

        assert!(matches!(err, PipelineError::SchemaError { ref column } if column == "h3"));
        assert_eq!(table, before);
    }

    #[test]
    fn test_no_sentinels_left() {
        let mut table =
            Table::from_csv("a,b,c\n8,1,9\n2,9,8\n9,8,3\n1,2,3").unwrap();
        recode_missing(&mut table, &policy(&["a", "b", "c"])).unwrap();
        for name in ["a", "b", "c"] {
            let values = table.numeric(name).unwrap();
            assert!(values.iter().flatten().all(|&v| v != 8.0 && v != 9.0));
        }
    }
}
