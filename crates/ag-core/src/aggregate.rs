//! Cross-keyword aggregation of event records.
//!
//! # Algorithm
//!
//! 1. Validate the search window (the only fatal error)
//! 2. For each keyword, in order, list candidate links from the source
//! 3. Drop links already in the run's [`SeenSet`]; mark the rest before any
//!    detail is fetched
//! 4. Fetch each fresh candidate, resolve its date phrase, assemble a record
//! 5. Keep complete records accepted by the window filter
//! 6. Stable-sort once by resolved start, unresolved records last
//!
//! Soft failures (unreachable detail, missing fields, unparseable dates,
//! duplicates) are counted in [`HarvestStats`], never returned as errors.

use chrono::NaiveDateTime;
use rayon::prelude::*;
use thiserror::Error;

use crate::record::{EventRecord, RawDetailBundle, RecordAssembler};
use crate::resolver::PhraseResolver;
use crate::seen::SeenSet;
use crate::types::{SearchWindow, SourceId, ValidationError};
use crate::window;

/// Capability that finds event links and fetches their detail text.
///
/// Implementations own timeouts and retries; a timeout is reported the same
/// way as a missing page.
pub trait EventSource {
    /// Candidate links for a search keyword, in discovery order.
    fn list_candidates(&self, keyword: &str) -> Vec<SourceId>;

    /// Detail fragments for one link, or `None` if it could not be fetched.
    fn fetch_detail(&self, id: &SourceId) -> Option<RawDetailBundle>;
}

impl<T: EventSource + ?Sized> EventSource for &T {
    fn list_candidates(&self, keyword: &str) -> Vec<SourceId> {
        (**self).list_candidates(keyword)
    }

    fn fetch_detail(&self, id: &SourceId) -> Option<RawDetailBundle> {
        (**self).fetch_detail(id)
    }
}

/// Aggregation errors.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The caller's search window is malformed.
    #[error("invalid search window: {0}")]
    InvalidWindow(#[from] ValidationError),
}

/// Configuration for aggregation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregatorConfig {
    /// Keep records whose date phrase did not resolve. They still fail any
    /// search window and sort after every resolved record.
    /// Default: false.
    pub keep_unresolved: bool,
}

/// Per-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestStats {
    pub keywords: usize,
    pub candidates: usize,
    pub duplicates: usize,
    pub unavailable: usize,
    pub incomplete: usize,
    pub unresolved: usize,
    pub filtered: usize,
    pub kept: usize,
}

/// Result of one aggregation run.
#[derive(Debug)]
pub struct Harvest {
    /// Records in chronological order, unresolved last.
    pub records: Vec<EventRecord>,
    pub stats: HarvestStats,
}

impl Harvest {
    pub fn into_records(self) -> Vec<EventRecord> {
        self.records
    }
}

/// What happened to one fresh candidate.
#[derive(Debug)]
enum Outcome {
    Kept(EventRecord),
    Unavailable,
    Incomplete,
    Unresolved,
    Filtered,
}

/// Drives repeated per-keyword collection into one deduplicated result set.
#[derive(Debug)]
pub struct Aggregator<'a, S: ?Sized> {
    source: &'a S,
    resolver: &'a PhraseResolver,
    reference: NaiveDateTime,
    config: AggregatorConfig,
}

impl<'a, S: EventSource + ?Sized> Aggregator<'a, S> {
    /// Creates an aggregator resolving dates against `reference`.
    pub fn new(source: &'a S, resolver: &'a PhraseResolver, reference: NaiveDateTime) -> Self {
        Self {
            source,
            resolver,
            reference,
            config: AggregatorConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Collects every keyword strictly in sequence.
    pub fn run<K: AsRef<str>>(
        &self,
        keywords: &[K],
        window: Option<&SearchWindow>,
    ) -> Result<Harvest, HarvestError> {
        self.harvest(keywords, window, |fresh| {
            fresh
                .into_iter()
                .map(|id| self.collect(id, window))
                .collect()
        })
    }

    /// Like [`run`](Self::run), but fetches each keyword's fresh candidates
    /// concurrently.
    ///
    /// Candidates are still marked seen one by one before any fetch starts,
    /// and outcomes are gathered in discovery order, so the result is the
    /// same as a sequential run.
    pub fn run_parallel<K: AsRef<str>>(
        &self,
        keywords: &[K],
        window: Option<&SearchWindow>,
    ) -> Result<Harvest, HarvestError>
    where
        S: Sync,
    {
        self.harvest(keywords, window, |fresh| {
            fresh
                .into_par_iter()
                .map(|id| self.collect(id, window))
                .collect()
        })
    }

    fn harvest<K, F>(
        &self,
        keywords: &[K],
        window: Option<&SearchWindow>,
        process: F,
    ) -> Result<Harvest, HarvestError>
    where
        K: AsRef<str>,
        F: Fn(Vec<SourceId>) -> Vec<Outcome>,
    {
        if let Some(window) = window {
            window.validate()?;
        }

        let mut seen = SeenSet::new();
        let mut stats = HarvestStats::default();
        let mut records = Vec::new();

        for keyword in keywords {
            let keyword = keyword.as_ref();
            stats.keywords += 1;

            let fresh = self.fresh_candidates(keyword, &mut seen, &mut stats);
            tracing::info!(keyword, fresh = fresh.len(), "searching");

            for outcome in process(fresh) {
                match outcome {
                    Outcome::Kept(record) => records.push(record),
                    Outcome::Unavailable => stats.unavailable += 1,
                    Outcome::Incomplete => stats.incomplete += 1,
                    Outcome::Unresolved => stats.unresolved += 1,
                    Outcome::Filtered => stats.filtered += 1,
                }
            }
        }

        sort_records(&mut records);
        stats.kept = records.len();
        tracing::info!(?stats, "harvest complete");

        Ok(Harvest { records, stats })
    }

    /// Lists a keyword's candidates and marks the unseen ones.
    fn fresh_candidates(
        &self,
        keyword: &str,
        seen: &mut SeenSet,
        stats: &mut HarvestStats,
    ) -> Vec<SourceId> {
        let candidates = self.source.list_candidates(keyword);
        stats.candidates += candidates.len();

        let mut fresh = Vec::with_capacity(candidates.len());
        for id in candidates {
            if seen.test_and_set(&id) {
                fresh.push(id);
            } else {
                tracing::debug!(link = %id, keyword, "skipping duplicate");
                stats.duplicates += 1;
            }
        }
        fresh
    }

    fn collect(&self, id: SourceId, window: Option<&SearchWindow>) -> Outcome {
        let Some(bundle) = self.source.fetch_detail(&id) else {
            tracing::debug!(link = %id, "detail unavailable");
            return Outcome::Unavailable;
        };

        let resolved = self.resolver.resolve(&bundle.date_fragment, self.reference);
        let record = RecordAssembler::new(self.resolver).assemble(id, &bundle, resolved);

        if !record.is_complete() {
            tracing::debug!(link = %record.link, "missing title, location or date");
            return Outcome::Incomplete;
        }
        if record.resolved.is_none() && !self.config.keep_unresolved {
            tracing::debug!(link = %record.link, date = %record.date_display, "unresolved date");
            return Outcome::Unresolved;
        }
        if !window::keep(record.resolved.as_ref(), window) {
            tracing::debug!(link = %record.link, "outside search window");
            return Outcome::Filtered;
        }
        Outcome::Kept(record)
    }
}

/// Stable sort by resolved start; unresolved records trail in their
/// existing order.
pub fn sort_records(records: &mut [EventRecord]) {
    records.sort_by_key(|record| {
        let start = record.start();
        (start.is_none(), start)
    });
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::NaiveDate;

    use super::*;
    use crate::vocabulary::Vocabulary;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    /// Tuesday 10 June 2025, midday.
    fn reference() -> NaiveDateTime {
        at(2025, 6, 10, 12, 0)
    }

    fn detail(title: &str, date: &str) -> RawDetailBundle {
        RawDetailBundle {
            title_fragment: title.to_string(),
            date_fragment: date.to_string(),
            location_fragment: "Paris, France".to_string(),
            description_fragment: format!("{title} description"),
            banner_url: None,
        }
    }

    /// In-memory source recording every call.
    #[derive(Default)]
    struct FakeSource {
        searches: HashMap<String, Vec<String>>,
        details: HashMap<String, RawDetailBundle>,
        listed: Mutex<Vec<String>>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn search(mut self, keyword: &str, links: &[&str]) -> Self {
            self.searches.insert(
                keyword.to_string(),
                links.iter().map(ToString::to_string).collect(),
            );
            self
        }

        fn detail(mut self, link: &str, bundle: RawDetailBundle) -> Self {
            self.details.insert(link.to_string(), bundle);
            self
        }

        fn fetch_count(&self, link: &str) -> usize {
            self.fetched
                .lock()
                .unwrap()
                .iter()
                .filter(|fetched| *fetched == link)
                .count()
        }
    }

    impl EventSource for FakeSource {
        fn list_candidates(&self, keyword: &str) -> Vec<SourceId> {
            self.listed.lock().unwrap().push(keyword.to_string());
            self.searches
                .get(keyword)
                .into_iter()
                .flatten()
                .filter_map(|link| SourceId::parse(link).ok())
                .collect()
        }

        fn fetch_detail(&self, id: &SourceId) -> Option<RawDetailBundle> {
            self.fetched.lock().unwrap().push(id.to_string());
            self.details.get(id.as_str()).cloned()
        }
    }

    /// Two keyword passes over overlapping results.
    ///
    /// - salsa: 1 (twice, once with a query string), 7 (unreachable), 2
    /// - tango: 4 (unresolved), 2 (duplicate), 3, 5 (unresolved), 6 (no title)
    fn source() -> FakeSource {
        FakeSource::default()
            .search("salsa", &["/events/1?ref=search", "/events/7", "/events/2", "/events/1"])
            .search("tango", &["/events/4", "/events/2?x=1", "/events/3", "/events/5", "/events/6"])
            .detail("/events/1", detail("Salsa night", "samedi de 20:00 à 01:30"))
            .detail("/events/2", detail("Salsa class", "demain à 19:00"))
            .detail("/events/3", detail("Milonga", "Vendredi 19 septembre 2025 à 21:00"))
            .detail("/events/4", detail("Tango practice", "bientôt"))
            .detail("/events/5", detail("Tango show", "prochainement"))
            .detail("/events/6", detail("", "demain à 20:00"))
    }

    fn resolver() -> PhraseResolver {
        PhraseResolver::new(Vocabulary::french()).unwrap()
    }

    fn links(harvest: &Harvest) -> Vec<&str> {
        harvest.records.iter().map(|r| r.link.as_str()).collect()
    }

    #[test]
    fn merges_keywords_in_chronological_order() {
        let source = source();
        let resolver = resolver();
        let harvest = Aggregator::new(&source, &resolver, reference())
            .run(&["salsa", "tango"], None)
            .unwrap();

        assert_eq!(links(&harvest), vec!["/events/2", "/events/1", "/events/3"]);
        assert_eq!(harvest.records[0].start(), Some(at(2025, 6, 11, 19, 0)));
        assert_eq!(
            harvest.stats,
            HarvestStats {
                keywords: 2,
                candidates: 9,
                duplicates: 2,
                unavailable: 1,
                incomplete: 1,
                unresolved: 2,
                filtered: 0,
                kept: 3,
            }
        );
    }

    #[test]
    fn rediscovered_link_yields_one_record_and_one_fetch() {
        let source = FakeSource::default()
            .search("salsa", &["/events/123"])
            .search("bachata", &["/events/123?ref=bachata"])
            .detail("/events/123", detail("Latin night", "samedi à 20:00"));
        let resolver = resolver();
        let harvest = Aggregator::new(&source, &resolver, reference())
            .run(&["salsa", "bachata"], None)
            .unwrap();

        assert_eq!(links(&harvest), vec!["/events/123"]);
        assert_eq!(source.fetch_count("/events/123"), 1);
        assert_eq!(harvest.stats.duplicates, 1);
    }

    #[test]
    fn duplicates_within_one_pass_are_fetched_once() {
        let source = source();
        let resolver = resolver();
        Aggregator::new(&source, &resolver, reference())
            .run(&["salsa"], None)
            .unwrap();
        assert_eq!(source.fetch_count("/events/1"), 1);
    }

    #[test]
    fn unresolved_records_trail_in_discovery_order() {
        let source = source();
        let resolver = resolver();
        let harvest = Aggregator::new(&source, &resolver, reference())
            .with_config(AggregatorConfig {
                keep_unresolved: true,
            })
            .run(&["salsa", "tango"], None)
            .unwrap();

        assert_eq!(
            links(&harvest),
            vec!["/events/2", "/events/1", "/events/3", "/events/4", "/events/5"]
        );
        assert_eq!(harvest.records[3].date_display, "bientôt");
        assert_eq!(harvest.stats.unresolved, 0);
    }

    #[test]
    fn window_filters_on_start() {
        let source = source();
        let resolver = resolver();
        let june = SearchWindow::new(at(2025, 6, 1, 0, 0), at(2025, 6, 30, 0, 0)).unwrap();
        let harvest = Aggregator::new(&source, &resolver, reference())
            .run(&["salsa", "tango"], Some(&june))
            .unwrap();

        assert_eq!(links(&harvest), vec!["/events/2", "/events/1"]);
        assert_eq!(harvest.stats.filtered, 1);
        assert_eq!(harvest.stats.unresolved, 2);
    }

    #[test]
    fn window_rejects_unresolved_even_when_kept() {
        let source = source();
        let resolver = resolver();
        let june = SearchWindow::new(at(2025, 6, 1, 0, 0), at(2025, 6, 30, 0, 0)).unwrap();
        let harvest = Aggregator::new(&source, &resolver, reference())
            .with_config(AggregatorConfig {
                keep_unresolved: true,
            })
            .run(&["tango"], Some(&june))
            .unwrap();

        // A fresh run: /events/2 is not a duplicate here.
        assert_eq!(links(&harvest), vec!["/events/2"]);
        assert_eq!(harvest.stats.filtered, 3);
    }

    #[test]
    fn window_end_is_inclusive() {
        let source = FakeSource::default()
            .search("salsa", &["/events/1"])
            .detail("/events/1", detail("Salsa night", "samedi à 20:00"));
        let resolver = resolver();
        let window = SearchWindow::new(reference(), at(2025, 6, 14, 20, 0)).unwrap();
        let harvest = Aggregator::new(&source, &resolver, reference())
            .run(&["salsa"], Some(&window))
            .unwrap();
        assert_eq!(links(&harvest), vec!["/events/1"]);
    }

    #[test]
    fn inverted_window_fails_before_any_lookup() {
        let source = source();
        let resolver = resolver();
        let window = SearchWindow {
            from: at(2025, 6, 30, 0, 0),
            to: at(2025, 6, 1, 0, 0),
        };
        let result = Aggregator::new(&source, &resolver, reference()).run(&["salsa"], Some(&window));

        assert!(matches!(result, Err(HarvestError::InvalidWindow(_))));
        assert!(source.listed.lock().unwrap().is_empty());
        assert!(source.fetched.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_keyword_is_not_an_error() {
        let source = source();
        let resolver = resolver();
        let harvest = Aggregator::new(&source, &resolver, reference())
            .run(&["zouk"], None)
            .unwrap();
        assert!(harvest.into_records().is_empty());
    }

    #[test]
    fn parallel_run_matches_sequential_run() {
        let resolver = resolver();
        let keywords = ["salsa", "tango"];
        let config = AggregatorConfig {
            keep_unresolved: true,
        };

        let sequential_source = source();
        let sequential = Aggregator::new(&sequential_source, &resolver, reference())
            .with_config(config)
            .run(&keywords, None)
            .unwrap();

        let parallel_source = source();
        let parallel = Aggregator::new(&parallel_source, &resolver, reference())
            .with_config(config)
            .run_parallel(&keywords, None)
            .unwrap();

        assert_eq!(parallel.records, sequential.records);
        assert_eq!(parallel.stats, sequential.stats);
        assert_eq!(parallel_source.fetch_count("/events/1"), 1);
        assert_eq!(parallel_source.fetch_count("/events/2"), 1);
    }

    #[test]
    fn sort_is_stable_for_equal_and_missing_starts() {
        let resolver = resolver();
        let assembler = RecordAssembler::new(&resolver);
        let make = |link: &str, start: Option<NaiveDateTime>| {
            assembler.assemble(
                SourceId::parse(link).unwrap(),
                &detail(link, "bientôt"),
                start.map(crate::types::ResolvedInterval::instant),
            )
        };

        let mut records = vec![
            make("/events/a", None),
            make("/events/b", Some(at(2025, 6, 12, 20, 0))),
            make("/events/c", None),
            make("/events/d", Some(at(2025, 6, 11, 20, 0))),
            make("/events/e", Some(at(2025, 6, 12, 20, 0))),
        ];
        sort_records(&mut records);

        let order: Vec<&str> = records.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(order, vec!["/events/d", "/events/b", "/events/e", "/events/a", "/events/c"]);
    }
}
