//! Batch dataset reader and writer
//!
//! Rows are loosely typed JSON objects (insertion ordered) so that columns
//! the classifier does not use survive into the output untouched. The format follows the file
//! extension: `.json` is an array of objects, anything else is CSV with a
//! header row.

use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::errors::{InvokeError, Result};

/// One dataset row
pub type Row = Map<String, Value>;

/// Supported dataset formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Csv,
        }
    }
}

pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let rows = match Format::from_path(path) {
        Format::Json => read_json(path)?,
        Format::Csv => read_csv(path)?,
    };
    info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn write_rows(path: &Path, rows: &[Row]) -> Result<()> {
    match Format::from_path(path) {
        Format::Json => write_json(path, rows)?,
        Format::Csv => write_csv(path, rows)?,
    }
    info!("Results saved to {}", path.display());
    Ok(())
}

fn read_json(path: &Path) -> Result<Vec<Row>> {
    let value: Value = serde_json::from_slice(&fs::read(path)?)
        .map_err(|e| InvokeError::Dataset(format!("{}: {e}", path.display())))?;
    let Value::Array(items) = value else {
        return Err(InvokeError::Dataset(format!(
            "{}: expected a JSON array of objects",
            path.display()
        )));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(row) => Ok(row),
            _ => Err(InvokeError::Dataset(format!(
                "{}: row {i} is not an object",
                path.display()
            ))),
        })
        .collect()
}

/// Empty cells become `null`, which the invoker sends as a missing field.
fn read_csv(path: &Path) -> Result<Vec<Row>> {
    let mut reader = csv::Reader::from_path(path).map_err(dataset_error)?;
    let headers = reader.headers().map_err(dataset_error)?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(dataset_error)?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(name, cell)| {
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                };
                (name.to_string(), value)
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn write_json(path: &Path, rows: &[Row]) -> Result<()> {
    let json = serde_json::to_vec_pretty(rows)
        .map_err(|e| InvokeError::Dataset(e.to_string()))?;
    fs::write(path, json)?;
    Ok(())
}

/// Columns in first-seen order across all rows.
pub fn columns(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for key in rows.iter().flat_map(|row| row.keys()) {
        if !columns.contains(key) {
            columns.push(key.clone());
        }
    }
    columns
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let columns = columns(rows);
    let mut writer = csv::Writer::from_path(path).map_err(dataset_error)?;
    writer.write_record(&columns).map_err(dataset_error)?;
    for row in rows {
        writer
            .write_record(columns.iter().map(|c| cell(row.get(c))))
            .map_err(dataset_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn dataset_error(err: csv::Error) -> InvokeError {
    InvokeError::Dataset(err.to_string())
}
