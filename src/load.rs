//! Raw wide-table loading. Every column comes in as String; typing and
//! coercion happen in the reshape pipeline.

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use polars::prelude::*;

use crate::error::ComexError;

/// Load the wide source table, dispatching on file extension.
pub fn load_wide_table(path: &Path) -> Result<DataFrame, ComexError> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("xlsx") | Some("xlsm") | Some("xls") => read_xlsx_as_strings(path),
        _ => read_csv_as_strings(path),
    }
}

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names.
pub fn read_csv_as_strings(path: &Path) -> Result<DataFrame, ComexError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

/// Read the first sheet of an xlsx workbook with all cells as String.
/// The first row is the header row; empty cells become nulls.
pub fn read_xlsx_as_strings(path: &Path) -> Result<DataFrame, ComexError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_names = workbook.sheet_names().to_vec();
    let sheet = sheet_names
        .first()
        .ok_or_else(|| ComexError::Validation("Workbook contains no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| ComexError::Validation(e.to_string()))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| ComexError::Validation("Sheet is empty".to_string()))?;

    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell_to_string(cell).unwrap_or_default().trim().to_string())
        .collect();

    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(headers.len()) {
            columns[i].push(cell_to_string(cell));
        }
        // calamine ranges are rectangular, but guard against short rows
        for col in columns.iter_mut().skip(row.len()) {
            col.push(None);
        }
    }

    let cols: Vec<Column> = headers
        .into_iter()
        .zip(columns)
        .map(|(name, values)| Column::new(name.into(), values))
        .collect();

    Ok(DataFrame::new(cols)?)
}

fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        // Excel stores integers as floats; render them without the ".0"
        Data::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::Error(e) => Some(format!("{e:?}")),
        Data::DateTime(dt) => Some(dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}
