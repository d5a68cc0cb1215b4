//! Input files: JSON payloads and the CSV export of a roster spreadsheet.

use std::io::Read;

use anyhow::Context;
use pal_core::matrix::Matrix;
use serde::de::DeserializeOwned;

/// Read a whole file, or stdin when `path` is `-`.
pub fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
}

/// Deserialize a JSON input file.
pub fn read_json<T: DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {path}"))
}

/// Parse CSV text into a cell matrix. Rows may have different lengths.
pub fn parse_csv_matrix(raw: &str, delimiter: u8) -> anyhow::Result<Matrix> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(raw.as_bytes());

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("malformed CSV at row {}", index + 1))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    Ok(Matrix::from_rows(rows))
}

/// Read a roster spreadsheet exported as CSV.
pub fn read_matrix(path: &str, delimiter: char) -> anyhow::Result<Matrix> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| format!("delimiter '{delimiter}' is not a single ASCII character"))?;
    let raw = read_input(path)?;
    parse_csv_matrix(&raw, delimiter).with_context(|| format!("failed to parse {path}"))
}
