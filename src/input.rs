//! Airport code input
//!
//! Codes come from a comma-separated command-line value and from an uploaded
//! sheet, either CSV or an Excel/OpenDocument workbook. Both are upper-cased
//! and concatenated; duplicates are kept so the output matches the input
//! multiplicity.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{DataType, Reader, open_workbook_auto_from_rs};
use tracing::debug;

use crate::models::AirportCode;
use crate::{BriefError, Result};

/// Sheet columns that hold airport codes, in the order they are read
pub const ICAO_COLUMNS: [&str; 3] = ["ICAO", "From (ICAO)", "To (ICAO)"];

/// Upload extensions read as workbooks, everything else is CSV
const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// Split a comma-separated list of codes, dropping blank entries
#[must_use]
pub fn parse_direct_input(text: &str) -> Vec<AirportCode> {
    text.split(',')
        .filter_map(|part| AirportCode::new(part).ok())
        .collect()
}

/// Codes of the known columns, column by column.
///
/// All codes of the `ICAO` column come first, then those of the route
/// columns `From (ICAO)` and `To (ICAO)` when the sheet has them. Blank cells
/// are skipped. A sheet with none of these columns is an input error.
fn codes_from_columns(headers: &[String], records: &[Vec<String>]) -> Result<Vec<AirportCode>> {
    let columns: Vec<usize> = ICAO_COLUMNS
        .iter()
        .filter_map(|name| headers.iter().position(|header| header.trim() == *name))
        .collect();
    if columns.is_empty() {
        return Err(BriefError::input(
            "Uploaded file must have a valid ICAO column",
        ));
    }

    let codes: Vec<AirportCode> = columns
        .iter()
        .flat_map(|&column| {
            records
                .iter()
                .filter_map(move |record| record.get(column))
                .filter_map(|cell| AirportCode::new(cell).ok())
        })
        .collect();

    debug!("Read {} codes from {} rows", codes.len(), records.len());
    Ok(codes)
}

/// Read airport codes from CSV data with a header row
pub fn read_upload<R: Read>(reader: R) -> Result<Vec<AirportCode>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| BriefError::input(format!("Error reading file: {e}")))?
        .iter()
        .map(String::from)
        .collect();

    let records: Vec<Vec<String>> = reader
        .records()
        .map(|record| record.map(|record| record.iter().map(String::from).collect()))
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| BriefError::input(format!("Error reading file: {e}")))?;

    codes_from_columns(&headers, &records)
}

/// Read airport codes from the first sheet of a workbook; its first row is the header
pub fn read_workbook<RS: Read + Seek + Clone>(data: RS) -> Result<Vec<AirportCode>> {
    let mut workbook = open_workbook_auto_from_rs(data)
        .map_err(|e| BriefError::input(format!("Not a readable workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| BriefError::input("Uploaded workbook has no sheets"))?
        .map_err(|e| BriefError::input(format!("Error reading file: {e}")))?;

    let mut rows = range.rows().map(|row| {
        row.iter()
            .map(|cell| cell.as_string().unwrap_or_default())
            .collect::<Vec<String>>()
    });
    let headers = rows.next().unwrap_or_default();
    let records: Vec<Vec<String>> = rows.collect();

    codes_from_columns(&headers, &records)
}

/// Read airport codes from an uploaded file, choosing the reader by extension
pub fn read_upload_file(path: &Path) -> Result<Vec<AirportCode>> {
    let is_workbook = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        });
    let mut file = File::open(path)
        .map_err(|e| BriefError::input(format!("Cannot open {}: {e}", path.display())))?;
    if !is_workbook {
        return read_upload(file);
    }

    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .map_err(|e| BriefError::input(format!("Cannot read {}: {e}", path.display())))?;
    read_workbook(Cursor::new(data))
}

/// Directly entered codes first, then uploaded ones
#[must_use]
pub fn merge_codes(direct: Vec<AirportCode>, uploaded: Vec<AirportCode>) -> Vec<AirportCode> {
    let mut codes = direct;
    codes.extend(uploaded);
    codes
}
