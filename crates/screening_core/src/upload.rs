//! Parsing of uploaded address lists
//!
//! Accepts CSV and both Excel formats, chosen by filename suffix only. The
//! first row is the header row; addresses are read from the first column of
//! every row after it.

use crate::{BulkError, UploadError};
use calamine::{Data, Range, Reader, Xls, Xlsx};
use std::fmt::Display;
use std::io::Cursor;
use tracing::{debug, info};

/// Accepted upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Xls,
    Xlsx,
}

impl UploadFormat {
    /// Pick the format from the filename suffix, case-insensitively
    pub fn from_filename(filename: &str) -> Result<Self, UploadError> {
        if filename.is_empty() {
            return Err(UploadError::EmptyFilename);
        }

        let lower = filename.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Ok(Self::Csv)
        } else if lower.ends_with(".xlsx") {
            Ok(Self::Xlsx)
        } else if lower.ends_with(".xls") {
            Ok(Self::Xls)
        } else {
            Err(UploadError::UnsupportedExtension(filename.to_string()))
        }
    }
}

/// Parsed upload: header row plus data rows, all cells as text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl UploadTable {
    /// (data rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);
        (self.rows.len(), columns)
    }

    /// First-column values of every data row, in file order
    pub fn emails(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.first().cloned().unwrap_or_default())
            .collect()
    }
}

/// Parse uploaded bytes in the given format
pub fn parse_upload(format: UploadFormat, bytes: &[u8]) -> Result<UploadTable, BulkError> {
    let table = match format {
        UploadFormat::Csv => parse_csv(bytes)?,
        UploadFormat::Xlsx => parse_sheet(Xlsx::new(Cursor::new(bytes)))?,
        UploadFormat::Xls => parse_sheet(Xls::new(Cursor::new(bytes)))?,
    };

    let (rows, columns) = table.shape();
    info!("File read successfully. Shape: ({}, {})", rows, columns);

    Ok(table)
}

fn parse_csv(bytes: &[u8]) -> Result<UploadTable, BulkError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| BulkError::FileParse(e.to_string()))?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| BulkError::FileParse(e.to_string()))?;
        let row: Vec<String> = record.iter().map(String::from).collect();
        if row.iter().all(String::is_empty) {
            continue;
        }
        rows.push(row);
    }

    Ok(UploadTable { headers, rows })
}

fn parse_sheet<'a, R>(workbook: Result<R, R::Error>) -> Result<UploadTable, BulkError>
where
    R: Reader<Cursor<&'a [u8]>>,
    R::Error: Display,
{
    let mut workbook = workbook.map_err(|e| BulkError::FileParse(e.to_string()))?;

    let sheets = workbook.sheet_names();
    debug!("Workbook sheets: {:?}", sheets);

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| BulkError::FileParse("workbook contains no worksheets".to_string()))?
        .map_err(|e| BulkError::FileParse(e.to_string()))?;

    Ok(table_from_range(&range))
}

fn table_from_range(range: &Range<Data>) -> UploadTable {
    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());

    let headers = rows.next().unwrap_or_default();
    let rows = rows
        .filter(|row| !row.iter().all(String::is_empty))
        .collect();

    UploadTable { headers, rows }
}

/// Render a cell the way it reads in the sheet; whole numbers lose the `.0`
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(UploadFormat::from_filename("list.csv"), Ok(UploadFormat::Csv));
        assert_eq!(UploadFormat::from_filename("list.xlsx"), Ok(UploadFormat::Xlsx));
        assert_eq!(UploadFormat::from_filename("list.xls"), Ok(UploadFormat::Xls));
        assert_eq!(UploadFormat::from_filename("LIST.CSV"), Ok(UploadFormat::Csv));
    }

    #[test]
    fn test_format_rejections() {
        assert_eq!(UploadFormat::from_filename(""), Err(UploadError::EmptyFilename));
        assert_eq!(
            UploadFormat::from_filename("list.txt"),
            Err(UploadError::UnsupportedExtension("list.txt".to_string()))
        );
        assert!(UploadFormat::from_filename("csv").is_err());
        assert!(UploadFormat::from_filename("list.csv.zip").is_err());
    }

    #[test]
    fn test_parse_csv_first_column() {
        let csv = "email,name\na@example.com,Ann\nb@example.com,Bob\n\nc@example.com\n";
        let table = parse_upload(UploadFormat::Csv, csv.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["email", "name"]);
        assert_eq!(table.shape(), (3, 2));
        assert_eq!(
            table.emails(),
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
    }

    #[test]
    fn test_parse_csv_header_only() {
        let table = parse_upload(UploadFormat::Csv, b"email\n").unwrap();
        assert_eq!(table.shape(), (0, 1));
        assert!(table.emails().is_empty());
    }

    #[test]
    fn test_parse_csv_invalid_utf8() {
        let bytes = b"email\n\xff\xfe@example.com\n";
        assert!(matches!(
            parse_upload(UploadFormat::Csv, bytes),
            Err(BulkError::FileParse(_))
        ));
    }

    #[test]
    fn test_parse_xlsx_first_sheet() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Email").unwrap();
        sheet.write_string(0, 1, "Id").unwrap();
        sheet.write_string(1, 0, "a@example.com").unwrap();
        sheet.write_number(1, 1, 7.0).unwrap();
        sheet.write_string(2, 0, "b@example.com").unwrap();
        sheet.write_number(2, 1, 2.5).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = parse_upload(UploadFormat::Xlsx, &bytes).unwrap();
        assert_eq!(table.headers, vec!["Email", "Id"]);
        assert_eq!(table.rows[0], vec!["a@example.com", "7"]);
        assert_eq!(table.rows[1], vec!["b@example.com", "2.5"]);
        assert_eq!(table.emails(), vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_parse_legacy_xls() {
        // BIFF8 workbook; row 3 is left blank
        let bytes = include_bytes!("../tests/fixtures/emails.xls");

        let table = parse_upload(UploadFormat::Xls, bytes).unwrap();
        assert_eq!(table.headers, vec!["email", "name", "score"]);
        assert_eq!(table.shape(), (3, 3));
        assert_eq!(table.rows[0], vec!["alice@example.com", "Alice", "12"]);
        assert_eq!(table.rows[2], vec!["carol@example.com", "Carol", "40.5"]);
        assert_eq!(
            table.emails(),
            vec!["alice@example.com", "bob@example.com", "carol@example.com"]
        );
    }

    #[test]
    fn test_garbage_spreadsheet_is_file_parse_error() {
        assert!(matches!(
            parse_upload(UploadFormat::Xlsx, b"definitely not a zip"),
            Err(BulkError::FileParse(_))
        ));
        assert!(matches!(
            parse_upload(UploadFormat::Xls, b"definitely not an ole file"),
            Err(BulkError::FileParse(_))
        ));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Float(3.0)), "3");
        assert_eq!(cell_text(&Data::Float(3.25)), "3.25");
        assert_eq!(cell_text(&Data::Int(12)), "12");
        assert_eq!(cell_text(&Data::Bool(true)), "true");
    }
}
