//! Text conversion helpers for preparing input files

use crate::error::Result;
use crate::input::Row;
use std::path::Path;

/// Columns of the standard vocabulary CSV
pub const STANDARD_COLUMNS: [&str; 4] = ["Word", "Meaning", "Example", "Notes"];

/// Parse blank-line separated blocks of `Key: Value` lines into rows
///
/// Lines without a colon or with an empty key or value are ignored.
pub fn convert_key_value_text(text: &str) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut current = Row::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                rows.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            let (key, value) = (key.trim(), value.trim());
            if !key.is_empty() && !value.is_empty() {
                current.insert(key, value);
            }
        }
    }

    if !current.is_empty() {
        rows.push(current);
    }
    rows
}

/// Write rows with the standard columns; missing fields are left empty
pub fn write_standard_csv(path: &Path, rows: &[Row]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(STANDARD_COLUMNS)?;
    for row in rows {
        writer.write_record(STANDARD_COLUMNS.iter().map(|c| row.get(c).unwrap_or("")))?;
    }
    writer.flush()?;

    tracing::debug!("Wrote {} entries to {:?}", rows.len(), path);
    Ok(())
}

/// Normalize pipe-table lines to `| a | b |`, dropping empty cells
///
/// Other lines are trimmed and copied.
pub fn fix_table_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let line = line.trim();
        if line.contains('|') {
            let cells: Vec<&str> = line
                .split('|')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect();
            out.push_str("| ");
            out.push_str(&cells.join(" | "));
            out.push_str(" |");
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BLOCKS: &str = "\
Word: Essen
Meaning: to eat
Example: Wir essen um acht Uhr: abends.

Word: Haus
Notes:
Meaning: house


";

    #[test]
    fn test_convert_blocks() {
        let rows = convert_key_value_text(BLOCKS);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Example"), Some("Wir essen um acht Uhr: abends."));
        assert_eq!(rows[1].get("Meaning"), Some("house"));
        assert_eq!(rows[1].get("Notes"), None);
    }

    #[test]
    fn test_write_standard_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("csv").join("out.csv");
        write_standard_csv(&path, &convert_key_value_text(BLOCKS)).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("Word,Meaning,Example,Notes"));
        assert_eq!(lines.next(), Some("Essen,to eat,Wir essen um acht Uhr: abends.,"));
        assert_eq!(lines.next(), Some("Haus,house,,"));
    }

    #[test]
    fn test_fix_table_text() {
        let fixed = fix_table_text("Title\n|WORD|MEANING\n|Haus| house ||\n\n");
        assert_eq!(fixed, "Title\n| WORD | MEANING |\n| Haus | house |\n\n");
    }
}
