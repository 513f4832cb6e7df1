//! Reading source files into raw records.
//!
//! Each table is read from `<input_dir>/<table>.<ext>` where the extension
//! picks the format:
//! - `.jsonl`: one JSON object per line
//! - `.json`: a single JSON array of objects
//! - `.csv`: header row names the columns, every cell is a raw string

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::record::RawRecord;
use crate::schema::TableSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    JsonLines,
    JsonArray,
    Csv,
}

impl SourceFormat {
    /// Lookup order when several files exist for one table
    pub const ALL: [SourceFormat; 3] = [
        SourceFormat::JsonLines,
        SourceFormat::JsonArray,
        SourceFormat::Csv,
    ];

    pub const fn extension(self) -> &'static str {
        match self {
            SourceFormat::JsonLines => "jsonl",
            SourceFormat::JsonArray => "json",
            SourceFormat::Csv => "csv",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }
}

/// Find the source file for a table, if any
pub fn find_source(input_dir: &Path, schema: &TableSchema) -> Option<PathBuf> {
    SourceFormat::ALL
        .iter()
        .map(|f| input_dir.join(format!("{}.{}", schema.name, f.extension())))
        .find(|p| p.is_file())
}

/// Read every record from a source file
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>> {
    let format = SourceFormat::from_path(path)
        .with_context(|| format!("Unsupported source file type: {:?}", path))?;

    match format {
        SourceFormat::JsonLines => read_json_lines(path),
        SourceFormat::JsonArray => read_json_array(path),
        SourceFormat::Csv => read_csv(path),
    }
}

fn read_json_lines(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse JSON at {:?}:{}", path, line_no + 1))?;
        match value {
            Value::Object(obj) => records.push(obj),
            other => bail!(
                "Expected a JSON object at {:?}:{}, found {}",
                path,
                line_no + 1,
                json_kind(&other)
            ),
        }
    }

    Ok(records)
}

fn read_json_array(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON in {:?}", path))?;

    let items = match value {
        Value::Array(items) => items,
        other => bail!("Expected a JSON array in {:?}, found {}", path, json_kind(&other)),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(obj) => Ok(obj),
            other => bail!(
                "Expected a JSON object at {:?}[{}], found {}",
                path,
                i,
                json_kind(&other)
            ),
        })
        .collect()
}

fn read_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open: {:?}", path))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header in {:?}", path))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (row_no, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Failed to read CSV row {} in {:?}", row_no + 1, path))?;

        let mut record = RawRecord::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            let value = if cell.is_empty() {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            record.insert(header.clone(), value);
        }
        records.push(record);
    }

    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
