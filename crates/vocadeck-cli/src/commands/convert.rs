//! Convert command

use crate::app::ConvertArgs;
use anyhow::{Context, Result};
use std::path::PathBuf;
use vocadeck_core::{convert_key_value_text, write_standard_csv, VocadeckError};

pub async fn run(args: ConvertArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(VocadeckError::InputNotFound(args.input.display().to_string()).into());
    }
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {:?}", args.input))?;

    let output = args.output.unwrap_or_else(|| {
        let stem = args
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        PathBuf::from("csv").join(format!("{}.csv", stem))
    });

    let rows = convert_key_value_text(&text);
    write_standard_csv(&output, &rows)?;

    println!(
        "Converted {} => {} with {} entries",
        args.input.display(),
        output.display(),
        rows.len()
    );
    Ok(())
}
