//! Bulk result table and its XLSX rendering
//!
//! Columns are `email` first, then every other field in the order it was
//! first seen across rows. The workbook is built entirely in memory.

use crate::{record::EMAIL_FIELD, BulkError, ValidationRecord};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde_json::Value;
use tracing::{debug, info};

/// Download name of the bulk report, whatever the upload format was
pub const RESULTS_FILENAME: &str = "validation_results.xlsx";
/// Name of the single worksheet in the report
pub const RESULTS_SHEET_NAME: &str = "Validation Results";
/// Content type of the bulk report
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Column-aligned view of bulk results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<Value>>>,
}

impl ResultTable {
    /// Align records into columns, `email` first
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ValidationRecord>,
    {
        let records: Vec<&ValidationRecord> = records.into_iter().collect();

        let mut columns = vec![EMAIL_FIELD.to_string()];
        for record in &records {
            for key in record.fields().keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).cloned())
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<Option<&Value>>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[index].as_ref()).collect())
    }
}

/// Serialize the table into XLSX bytes
pub fn write_workbook(table: &ResultTable) -> Result<Vec<u8>, BulkError> {
    let bytes = build_workbook(table).map_err(|e| BulkError::Workbook(e.to_string()))?;
    info!("Excel file created successfully");
    debug!("Workbook size: {} bytes", bytes.len());
    Ok(bytes)
}

fn build_workbook(table: &ResultTable) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(RESULTS_SHEET_NAME)?;

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col_index(col)?, name, &header_format)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = row_index(row_idx + 1)?;
        for (col, cell) in row.iter().enumerate() {
            let col_num = col_index(col)?;
            match cell {
                None | Some(Value::Null) => {}
                Some(Value::Bool(b)) => {
                    worksheet.write_boolean(row_num, col_num, *b)?;
                }
                Some(Value::Number(n)) => match n.as_f64() {
                    Some(f) => {
                        worksheet.write_number(row_num, col_num, f)?;
                    }
                    None => {
                        worksheet.write_string(row_num, col_num, n.to_string())?;
                    }
                },
                Some(Value::String(s)) => {
                    worksheet.write_string(row_num, col_num, s)?;
                }
                Some(nested) => {
                    worksheet.write_string(row_num, col_num, nested.to_string())?;
                }
            }
        }
    }

    worksheet.autofit();
    workbook.save_to_buffer()
}

fn row_index(row: usize) -> Result<u32, XlsxError> {
    u32::try_from(row).map_err(|_| XlsxError::RowColumnLimitError)
}

fn col_index(col: usize) -> Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, Xlsx};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Cursor;

    fn record(value: Value) -> ValidationRecord {
        ValidationRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_email_column_first_then_first_seen_order() {
        let records = [
            record(json!({"valid": true, "fraud_score": 10, "email": "a@example.com", "suspicious": false})),
            record(json!({"email": "b@example.com", "Status": "Error", "Sub_Status": "boom", "suspicious": true})),
            record(json!({"valid": false, "leaked": true, "email": "c@example.com", "suspicious": true})),
        ];

        let table = ResultTable::from_records(&records);

        assert_eq!(
            table.columns,
            vec!["email", "valid", "fraud_score", "suspicious", "Status", "Sub_Status", "leaked"]
        );
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[1][1], None);
        assert_eq!(table.rows[1][4], Some(json!("Error")));
        assert_eq!(
            table.column("email").unwrap(),
            vec![
                Some(&json!("a@example.com")),
                Some(&json!("b@example.com")),
                Some(&json!("c@example.com"))
            ]
        );
    }

    #[test]
    fn test_empty_table_has_email_column() {
        let table = ResultTable::from_records(std::iter::empty());
        assert_eq!(table.columns, vec!["email"]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_workbook_round_trip() {
        let records = [
            record(json!({"email": "a@example.com", "fraud_score": 88, "valid": true, "suspicious": true})),
            record(json!({"email": "b@example.com", "domain": {"name": "example.com"}, "suspicious": false})),
        ];
        let table = ResultTable::from_records(&records);

        let bytes = write_workbook(&table).unwrap();

        let mut workbook = Xlsx::new(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![RESULTS_SHEET_NAME.to_string()]);

        let range = workbook.worksheet_range(RESULTS_SHEET_NAME).unwrap();
        let rows: Vec<&[Data]> = range.rows().collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], Data::String("email".to_string()));
        assert_eq!(rows[0][1], Data::String("fraud_score".to_string()));
        assert_eq!(rows[1][0], Data::String("a@example.com".to_string()));
        assert_eq!(rows[1][1], Data::Float(88.0));
        assert_eq!(rows[1][2], Data::Bool(true));
        assert_eq!(rows[2][0], Data::String("b@example.com".to_string()));
        assert_eq!(rows[2][1], Data::Empty);
        assert_eq!(
            rows[2][4],
            Data::String(r#"{"name":"example.com"}"#.to_string())
        );
    }
}
