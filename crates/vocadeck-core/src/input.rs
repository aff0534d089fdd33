//! Vocabulary table input: Markdown pipe tables and CSV/TSV files

use crate::error::{Result, VocadeckError};
use csv::ReaderBuilder;
use serde::Serialize;
use std::path::Path;

/// One input row: field name -> value, in column order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an existing value with the same name
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

/// Supported input layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Markdown,
    Csv,
    Tsv,
}

/// Pick a parser from the file extension, falling back to sniffing the content
pub fn detect_format(path: &Path, content: &str) -> InputFormat {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("csv") => InputFormat::Csv,
        Some("tsv") => InputFormat::Tsv,
        _ => {
            let first_line = content.lines().find(|l| !l.trim().is_empty());
            match first_line {
                Some(line) if line.contains('|') => InputFormat::Markdown,
                _ => InputFormat::Csv,
            }
        }
    }
}

/// Read and parse an input file; zero rows is an error
pub fn parse_input(path: &Path) -> Result<Vec<Row>> {
    if !path.exists() {
        return Err(VocadeckError::InputNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;

    let rows = match detect_format(path, &content) {
        InputFormat::Markdown => parse_markdown_table(&content),
        InputFormat::Csv => parse_delimited(&content, b',')?,
        InputFormat::Tsv => parse_delimited(&content, b'\t')?,
    };

    if rows.is_empty() {
        return Err(VocadeckError::InvalidInput(format!(
            "No data rows found in {}",
            path.display()
        )));
    }

    tracing::debug!("Parsed {} rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// Split a pipe-table line into trimmed cells between the outer pipes
fn table_cells(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.trim().split('|').collect();
    if parts.len() < 2 {
        return Vec::new();
    }
    parts[1..parts.len() - 1]
        .iter()
        .map(|c| c.trim().to_string())
        .collect()
}

/// Parse a Markdown pipe table
///
/// The first line containing `|` is the header. Lines with `---` are
/// separators, lines without `|` are ignored, and rows whose cell count
/// differs from the header are skipped.
pub fn parse_markdown_table(text: &str) -> Vec<Row> {
    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if !line.contains('|') || line.contains("---") {
            continue;
        }

        let cells = table_cells(line);
        let Some(header) = &headers else {
            headers = Some(cells);
            continue;
        };

        if cells.len() != header.len() {
            tracing::warn!(
                "Skipping line {}: expected {} cells, found {}",
                line_no + 1,
                header.len(),
                cells.len()
            );
            continue;
        }

        rows.push(header.iter().cloned().zip(cells).collect());
    }

    rows
}

/// Parse comma separated text with a header row
pub fn parse_csv(text: &str) -> Result<Vec<Row>> {
    parse_delimited(text, b',')
}

fn parse_delimited(text: &str, delimiter: u8) -> Result<Vec<Row>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for (row_num, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Skipping CSV row {}: {}", row_num + 1, e);
                continue;
            }
        };

        let row: Row = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .collect();

        if row.iter().any(|(_, v)| !v.is_empty()) {
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Check that text is a well-formed Markdown table
///
/// Requires a header line with `|`, a `---` separator, and the header's
/// column count on every following table line.
pub fn validate_markdown_table(text: &str) -> Result<()> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    let header = lines
        .next()
        .filter(|l| l.contains('|'))
        .ok_or_else(|| VocadeckError::InvalidInput("Missing table header line".to_string()))?;
    let columns = table_cells(header).len();

    match lines.next() {
        Some(sep) if sep.contains("---") => {}
        _ => {
            return Err(VocadeckError::InvalidInput(
                "Missing header separator line".to_string(),
            ))
        }
    }

    for (idx, line) in lines.enumerate() {
        let found = table_cells(line).len();
        if found != columns {
            return Err(VocadeckError::InvalidInput(format!(
                "Row {} has {} columns, expected {}",
                idx + 1,
                found,
                columns
            )));
        }
    }

    Ok(())
}
