//! Summary output

use crate::app::OutputFormat;
use serde::Serialize;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use vocadeck_core::{CacheStats, RunSummary};

/// Result of a `build` run
#[derive(Serialize)]
pub struct BuildReport {
    pub deck_name: String,
    pub deck_path: PathBuf,
    #[serde(flatten)]
    pub summary: RunSummary,
}

fn stdout() -> StandardStream {
    let choice = if std::io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

fn line(
    out: &mut StandardStream,
    label: &str,
    value: impl std::fmt::Display,
    color: Option<Color>,
) -> std::io::Result<()> {
    write!(out, "{:<17}", label)?;
    if let Some(color) = color {
        out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    }
    writeln!(out, "{}", value)?;
    out.reset()
}

pub fn print_build_report(report: &BuildReport, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let s = &report.summary;
    let mut out = stdout();
    writeln!(
        out,
        "Deck '{}' written to {}",
        report.deck_name,
        report.deck_path.display()
    )?;
    writeln!(out)?;
    line(&mut out, "Rows:", s.total_rows, None)?;
    line(&mut out, "Cards:", s.cards, None)?;
    line(&mut out, "With image:", s.with_image, Some(Color::Green))?;
    let warn = |n: usize| (n > 0).then_some(Color::Yellow);
    line(&mut out, "Degraded:", s.degraded, warn(s.degraded))?;
    line(&mut out, "Skipped:", s.skipped, warn(s.skipped))?;
    writeln!(out)?;
    writeln!(out, "Image lookup:")?;
    line(&mut out, "  Cache hits:", s.fetch.cache_hits, None)?;
    line(&mut out, "  Provider calls:", s.fetch.provider_calls, None)?;
    line(&mut out, "  Errors:", s.fetch.provider_errors, None)?;
    line(&mut out, "  Relaxed:", s.fetch.relaxed_searches, None)?;
    line(&mut out, "  Fallbacks:", s.fetch.fallbacks, None)?;
    Ok(())
}

pub fn print_cache_stats(
    path: &Path,
    stats: &CacheStats,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        let value = serde_json::json!({
            "path": path,
            "total_entries": stats.total_entries,
            "expired_entries": stats.expired_entries,
            "active_entries": stats.active_entries,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let mut out = stdout();
    line(&mut out, "Cache:", path.display(), None)?;
    line(&mut out, "Entries:", stats.total_entries, None)?;
    line(&mut out, "Active:", stats.active_entries, Some(Color::Green))?;
    line(&mut out, "Expired:", stats.expired_entries, None)?;
    Ok(())
}
