//! Harvest command for collecting events across keywords.
//!
//! This module implements `agenda harvest` which searches every keyword,
//! merges the results into one chronological list, prints it, and writes a
//! result file.

use std::fmt::Write;
use std::time::Duration;

use ag_core::{
    Aggregator, AggregatorConfig, EventRecord, EventSource, HarvestStats, PhraseResolver,
    SearchWindow, Vocabulary,
};
use ag_source::{CatalogSource, HttpSource};
use ag_store::StoredEvent;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use super::util::{now, parse_time};
use crate::{Config, HarvestArgs};

/// Keywords from the command line, falling back to the configured list.
pub fn select_keywords(args: &HarvestArgs, config: &Config) -> Result<Vec<String>> {
    let keywords: Vec<String> = if args.keywords.is_empty() {
        config.keywords.clone()
    } else {
        args.keywords.clone()
    };
    let keywords: Vec<String> = keywords
        .into_iter()
        .map(|keyword| keyword.trim().to_string())
        .filter(|keyword| !keyword.is_empty())
        .collect();
    if keywords.is_empty() {
        anyhow::bail!("No keywords to search. Pass --keyword or set `keywords` in the config file");
    }
    Ok(keywords)
}

/// The search window for this run, or `None` with `--all-dates`.
///
/// The window is not validated here; the aggregator rejects `from > to`.
pub fn select_window(
    args: &HarvestArgs,
    config: &Config,
    now: NaiveDateTime,
) -> Result<Option<SearchWindow>> {
    if args.all_dates {
        return Ok(None);
    }

    let from = match &args.from {
        Some(value) => parse_time(value, now)?,
        None => now,
    };
    let window = match &args.to {
        Some(value) => SearchWindow {
            from,
            to: parse_time(value, now)?,
        },
        None => {
            let days = args.days.unwrap_or(config.window_days);
            SearchWindow::days_from(from, i64::from(days)).context("window length too large")?
        }
    };
    Ok(Some(window))
}

/// Opens the catalog or fetch service, command line first.
fn open_source(args: &HarvestArgs, config: &Config) -> Result<Box<dyn EventSource + Sync>> {
    let catalog = match (&args.catalog, &args.endpoint) {
        (Some(path), _) => Some(path),
        (None, None) => config.catalog.as_ref(),
        (None, Some(_)) => None,
    };
    if let Some(path) = catalog {
        let source = CatalogSource::load(path).context("failed to load catalog")?;
        return Ok(Box::new(source));
    }

    let Some(endpoint) = args.endpoint.as_ref().or(config.endpoint.as_ref()) else {
        anyhow::bail!("No event source. Pass --catalog or --endpoint, or set one in the config file");
    };
    let timeout = Duration::from_secs(config.fetch_timeout_secs);
    let source = HttpSource::new(endpoint.as_str(), timeout).context("failed to create fetch client")?;
    Ok(Box::new(source))
}

/// Formats records for display, one line each.
pub fn format_records(records: &[EventRecord], stats: &HarvestStats) -> String {
    let mut output = String::new();

    if records.is_empty() {
        writeln!(output, "No events found.").unwrap();
    }
    for record in records {
        writeln!(
            output,
            "{:<28}  {}  ({})  {}",
            record.date_display, record.title, record.location, record.link
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    write!(
        output,
        "{} kept from {} candidates across {} keywords ({} duplicate, {} unavailable, {} incomplete, {} unresolved, {} outside window)",
        stats.kept,
        stats.candidates,
        stats.keywords,
        stats.duplicates,
        stats.unavailable,
        stats.incomplete,
        stats.unresolved,
        stats.filtered,
    )
    .unwrap();
    output
}

/// Formats records as the persisted JSON array.
pub fn format_records_json(records: &[EventRecord]) -> Result<String> {
    let events: Vec<StoredEvent> = records.iter().map(StoredEvent::from).collect();
    Ok(ag_store::to_json(&events)?)
}

/// Run the harvest command.
pub fn run(args: &HarvestArgs, config: &Config) -> Result<()> {
    let now = now();
    let keywords = select_keywords(args, config)?;
    let window = select_window(args, config, now)?;
    let source = open_source(args, config)?;
    let resolver = PhraseResolver::new(Vocabulary::for_locale(config.locale))
        .context("failed to build phrase resolver")?;

    let aggregator = Aggregator::new(&*source, &resolver, now).with_config(AggregatorConfig {
        keep_unresolved: args.keep_unresolved || config.keep_unresolved,
    });
    let harvest = if args.parallel || config.parallel {
        aggregator.run_parallel(&keywords, window.as_ref())
    } else {
        aggregator.run(&keywords, window.as_ref())
    }
    .context("harvest failed")?;

    if args.json {
        println!("{}", format_records_json(&harvest.records)?);
    } else {
        println!("{}", format_records(&harvest.records, &harvest.stats));
    }

    if !args.no_save {
        let city = args.city.as_deref().unwrap_or(&config.city);
        let path = ag_store::save_events(&harvest.records, city, &config.output_dir, now)
            .context("failed to save events")?;
        // stdout stays parseable with --json
        eprintln!("Saved {} events to {}", harvest.records.len(), path.display());
    }

    Ok(())
}
