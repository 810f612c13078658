// CSV input for the chart pipelines

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Raw CSV contents: header row plus string-valued data rows
#[derive(Debug, Clone, Default)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read a CSV file with a header row
pub fn read_csv_from_path(path: &Path) -> Result<CsvData> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;
    read_csv_from_reader(file).with_context(|| format!("Failed to parse '{}'", path.display()))
}

/// Parse CSV text already held in memory
pub fn read_csv_from_str(text: &str) -> Result<CsvData> {
    read_csv_from_reader(text.as_bytes())
}

/// Read CSV from any reader. Short rows are padded with empty fields; a row
/// of blank fields is kept as a row of empty fields.
pub fn read_csv_from_reader<R: Read>(reader: R) -> Result<CsvData> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header row")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        anyhow::bail!("CSV input has no header row");
    }

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record at row {}", row_idx + 1))?;
        let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(CsvData { headers, rows })
}
