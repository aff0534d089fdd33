//! Fix-table command

use crate::app::FixTableArgs;
use anyhow::{Context, Result};
use vocadeck_core::{fix_table_text, VocadeckError};

pub async fn run(args: FixTableArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(VocadeckError::InputNotFound(args.input.display().to_string()).into());
    }
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {:?}", args.input))?;

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&args.output, fix_table_text(&text))?;

    println!("File fixed and saved as {}", args.output.display());
    Ok(())
}
