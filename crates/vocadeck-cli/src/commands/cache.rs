//! Cache command

use crate::app::{CacheAction, CacheArgs, OutputFormat};
use crate::output::print_cache_stats;
use anyhow::Result;
use vocadeck_core::cache::now_timestamp;
use vocadeck_core::{Config, ImageCache};

pub async fn run(args: CacheArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let path = config.cache_path();
    let cache = ImageCache::open(&path)?;

    match args.action {
        CacheAction::Stats => {
            let stats = cache.stats(now_timestamp())?;
            print_cache_stats(&path, &stats, format)?;
        }
        CacheAction::Purge => {
            let removed = cache.purge_expired(now_timestamp())?;
            report_removed(removed, "expired entries", format)?;
        }
        CacheAction::Clear => {
            let removed = cache.clear()?;
            report_removed(removed, "entries", format)?;
        }
    }
    Ok(())
}

fn report_removed(removed: usize, what: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "removed": removed }));
        }
        OutputFormat::Cli => println!("Removed {} {}", removed, what),
    }
    Ok(())
}
