//! Build command

use crate::app::{BuildArgs, OutputFormat};
use crate::output::{print_build_report, BuildReport};
use crate::progress::ProgressReporter;
use anyhow::Result;
use std::sync::Arc;
use vocadeck_core::deck::deck_path;
use vocadeck_core::{
    parse_input, sanitize_deck_name, write_deck_csv, AbortSignal, Config, DatamuseLookup,
    DeckBuilder, FetchSession, ImageCache, ImageFetcher, ProviderChain, SynonymStore,
};

pub async fn run(args: BuildArgs, mut config: Config, format: OutputFormat) -> Result<()> {
    apply_flags(&args, &mut config);

    // Configuration problems abort before any row is touched
    let chain = if args.no_images {
        None
    } else {
        Some(ProviderChain::from_config(&config)?)
    };

    let deck_name = match &args.deck_name {
        Some(name) => sanitize_deck_name(name)?,
        None => sanitize_deck_name(
            &args
                .input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )?,
    };

    let rows = parse_input(&args.input)?;

    let mut builder = match chain {
        None => DeckBuilder::text_only(),
        Some(chain) => {
            tracing::debug!("Providers: {:?}", chain.names());
            let cache = ImageCache::open_or_empty(config.cache_path())?;
            let fetcher = ImageFetcher::new(chain, cache, config.fetch.clone());

            let synonyms = if config.fetch.use_synonyms {
                SynonymStore::load(&config.synonyms.path)
            } else {
                SynonymStore::in_memory(Default::default())
            };

            let builder = DeckBuilder::new(fetcher, synonyms);
            if config.fetch.use_synonyms && config.synonyms.online {
                builder.with_lookup(Arc::new(DatamuseLookup::new(&config.synonyms)?))
            } else {
                builder
            }
        }
    };

    let abort = AbortSignal::new();
    watch_interrupt(abort.clone());
    builder = builder.with_session(FetchSession::with_abort(abort));

    let mut progress = ProgressReporter::new(rows.len(), format == OutputFormat::Cli);
    let (cards, summary) = builder
        .process_with_progress(&rows, |_, front| {
            progress.set_message(front);
            progress.increment();
        })
        .await;
    progress.finish();

    let path = deck_path(&args.output_dir, &deck_name);
    write_deck_csv(&path, &cards)?;

    print_build_report(
        &BuildReport {
            deck_name,
            deck_path: path,
            summary,
        },
        format,
    )
}

fn apply_flags(args: &BuildArgs, config: &mut Config) {
    let fetch = &mut config.fetch;
    if args.no_synonyms {
        fetch.use_synonyms = false;
    }
    if args.offline_synonyms {
        config.synonyms.online = false;
    }
    if args.nlp {
        fetch.apply_nlp = true;
    }
    if args.strict {
        fetch.strict_filters = true;
    }
    if args.no_rank {
        fetch.rank_by_metadata = false;
    }
    if !args.tags.is_empty() {
        fetch.tags = args.tags.clone();
    }

    let filter = &mut fetch.metadata_filter;
    if let Some(n) = args.min_likes {
        filter.min_likes = n;
    }
    if let Some(n) = args.min_downloads {
        filter.min_downloads = n;
    }
    if let Some(n) = args.min_views {
        filter.min_views = n;
    }
    if let Some(n) = args.min_comments {
        filter.min_comments = n;
    }
}

/// Raise the abort signal on Ctrl-C; rows still pending get no image
fn watch_interrupt(abort: AbortSignal) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing without further image searches");
            abort.abort();
        }
    });
}
