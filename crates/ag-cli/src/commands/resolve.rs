//! Resolve command for checking how a date phrase is understood.
//!
//! This module implements `agenda resolve` which runs one phrase through the
//! resolver and prints the matched grammar case and interval.

use std::fmt::Write;

use ag_core::{GrammarCase, PhraseResolver, ResolvedInterval, Vocabulary};
use ag_store::TIMESTAMP_FORMAT;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use super::util::{now, parse_time};
use crate::{Config, ResolveArgs};

/// Formats a resolution result for display.
pub fn format_resolution(
    case: Option<GrammarCase>,
    resolved: Option<&ResolvedInterval>,
    reference: NaiveDateTime,
) -> String {
    let mut output = String::new();
    writeln!(output, "reference: {}", reference.format(TIMESTAMP_FORMAT)).unwrap();
    writeln!(
        output,
        "case:      {}",
        case.map_or("none", |case| case.as_str())
    )
    .unwrap();

    match resolved {
        Some(interval) => {
            writeln!(output, "start:     {}", interval.start().format(TIMESTAMP_FORMAT)).unwrap();
            write!(output, "end:       {}", interval.end().format(TIMESTAMP_FORMAT)).unwrap();
        }
        None => write!(output, "unresolved").unwrap(),
    }
    output
}

/// Run the resolve command.
pub fn run(args: &ResolveArgs, config: &Config) -> Result<()> {
    let reference = match &args.reference {
        Some(value) => parse_time(value, now())?,
        None => now(),
    };
    let locale = args.locale.unwrap_or(config.locale);
    let resolver = PhraseResolver::new(Vocabulary::for_locale(locale))
        .context("failed to build phrase resolver")?;

    let case = resolver.classify(&args.phrase);
    let resolved = resolver.resolve(&args.phrase, reference);
    tracing::debug!(%locale, ?case, resolved = resolved.is_some(), "resolved phrase");

    println!("{}", format_resolution(case, resolved.as_ref(), reference));
    Ok(())
}
