//! Core domain logic for agenda.
//!
//! This crate contains the fundamental types and logic for:
//! - Resolution: turning natural-language date phrases into absolute intervals
//! - Aggregation: merging many keyword searches into one deduplicated,
//!   chronologically ordered set of event records

mod aggregate;
pub mod record;
pub mod resolver;
pub mod seen;
pub mod types;
pub mod vocabulary;
pub mod window;

pub use aggregate::{
    Aggregator, AggregatorConfig, EventSource, Harvest, HarvestError, HarvestStats, sort_records,
};
pub use record::{EventRecord, RawDetailBundle, RecordAssembler};
pub use resolver::{GrammarCase, PhraseResolver};
pub use seen::SeenSet;
pub use types::{Locale, ResolvedInterval, SearchWindow, SourceId, ValidationError};
pub use vocabulary::Vocabulary;
