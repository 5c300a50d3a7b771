//! Event records and their assembly from raw detail fragments.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::resolver::PhraseResolver;
use crate::types::{ResolvedInterval, SourceId};

/// Longest short description kept, in characters.
const SHORT_DESCRIPTION_CHARS: usize = 200;

/// Raw text extracted from one event detail page.
///
/// Fragments are as the fetcher found them: untrimmed and possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDetailBundle {
    pub title_fragment: String,
    pub date_fragment: String,
    pub location_fragment: String,
    pub description_fragment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
}

/// One event as handed to the caller.
///
/// Optional fields keep "absent" distinct from "empty"; the distinction is
/// only dropped when the record is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub title: String,
    pub location: String,
    pub description_short: Option<String>,
    pub description_long: Option<String>,
    pub image: Option<String>,
    /// Canonical link, equal to the source identifier.
    pub link: SourceId,
    pub cost: Option<String>,
    pub kind: Option<String>,
    /// Human-readable date: normalized when resolved, raw fragment otherwise.
    pub date_display: String,
    pub resolved: Option<ResolvedInterval>,
}

impl EventRecord {
    /// Whether every required field (title, location, date) is present.
    pub fn is_complete(&self) -> bool {
        !self.title.is_empty() && !self.location.is_empty() && !self.date_display.is_empty()
    }

    /// Resolved start instant, if any.
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.resolved.as_ref().map(ResolvedInterval::start)
    }
}

/// Shapes raw fragments and a resolved interval into an [`EventRecord`].
#[derive(Debug, Clone, Copy)]
pub struct RecordAssembler<'r> {
    resolver: &'r PhraseResolver,
}

impl<'r> RecordAssembler<'r> {
    pub const fn new(resolver: &'r PhraseResolver) -> Self {
        Self { resolver }
    }

    /// Builds the record for `link`.
    ///
    /// The date display uses the resolver's vocabulary, e.g.
    /// `Samedi - 20h00 à 01h30`.
    pub fn assemble(
        &self,
        link: SourceId,
        bundle: &RawDetailBundle,
        resolved: Option<ResolvedInterval>,
    ) -> EventRecord {
        let date_fragment = bundle.date_fragment.trim();
        let date_display = resolved
            .as_ref()
            .and_then(|interval| self.display(interval))
            .unwrap_or_else(|| date_fragment.to_string());
        let description = non_empty(&bundle.description_fragment);

        EventRecord {
            title: bundle.title_fragment.trim().to_string(),
            location: bundle.location_fragment.trim().to_string(),
            description_short: description.as_deref().and_then(short_description),
            description_long: description,
            image: bundle.banner_url.as_deref().and_then(non_empty),
            link,
            cost: None,
            kind: None,
            date_display,
            resolved,
        }
    }

    fn display(&self, interval: &ResolvedInterval) -> Option<String> {
        let vocabulary = self.resolver.vocabulary();
        let weekday = vocabulary.weekday_name(interval.start().weekday())?;
        Some(format!(
            "{weekday} - {} {} {}",
            interval.start().format("%Hh%M"),
            vocabulary.until(),
            interval.end().format("%Hh%M"),
        ))
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// First non-empty line, cut on a character boundary.
fn short_description(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    if line.chars().count() <= SHORT_DESCRIPTION_CHARS {
        return Some(line.to_string());
    }
    let mut short: String = line.chars().take(SHORT_DESCRIPTION_CHARS).collect();
    short.push('…');
    Some(short)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::Vocabulary;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn bundle() -> RawDetailBundle {
        RawDetailBundle {
            title_fragment: "  Soirée Salsa  ".to_string(),
            date_fragment: "samedi de 20:00 à 01:30".to_string(),
            location_fragment: "La Bellevilloise, Paris, France\n".to_string(),
            description_fragment: "\nCours de salsa puis soirée.\nEntrée libre.".to_string(),
            banner_url: Some("https://cdn.example/banner.jpg".to_string()),
        }
    }

    fn link() -> SourceId {
        SourceId::parse("/events/123").unwrap()
    }

    #[test]
    fn assembles_resolved_record() {
        let resolver = PhraseResolver::new(Vocabulary::french()).unwrap();
        let interval = ResolvedInterval::new(at(2025, 6, 14, 20, 0), at(2025, 6, 15, 1, 30));
        let record = RecordAssembler::new(&resolver).assemble(link(), &bundle(), interval);

        assert_eq!(record.title, "Soirée Salsa");
        assert_eq!(record.location, "La Bellevilloise, Paris, France");
        assert_eq!(record.date_display, "Samedi - 20h00 à 01h30");
        assert_eq!(record.description_short.as_deref(), Some("Cours de salsa puis soirée."));
        assert_eq!(
            record.description_long.as_deref(),
            Some("Cours de salsa puis soirée.\nEntrée libre.")
        );
        assert_eq!(record.image.as_deref(), Some("https://cdn.example/banner.jpg"));
        assert_eq!(record.link, link());
        assert_eq!(record.cost, None);
        assert_eq!(record.kind, None);
        assert_eq!(record.start(), Some(at(2025, 6, 14, 20, 0)));
        assert!(record.is_complete());
    }

    #[test]
    fn english_display_uses_english_words() {
        let resolver = PhraseResolver::new(Vocabulary::english()).unwrap();
        let interval = Some(ResolvedInterval::instant(at(2025, 9, 19, 21, 0)));
        let record = RecordAssembler::new(&resolver).assemble(link(), &bundle(), interval);
        assert_eq!(record.date_display, "Friday - 21h00 to 21h00");
    }

    #[test]
    fn unresolved_record_keeps_raw_fragment() {
        let resolver = PhraseResolver::new(Vocabulary::french()).unwrap();
        let mut raw = bundle();
        raw.date_fragment = " Bientôt ".to_string();
        let record = RecordAssembler::new(&resolver).assemble(link(), &raw, None);
        assert_eq!(record.date_display, "Bientôt");
        assert_eq!(record.start(), None);
        assert!(record.is_complete());
    }

    #[test]
    fn empty_fragments_become_absent_or_incomplete() {
        let resolver = PhraseResolver::new(Vocabulary::french()).unwrap();
        let raw = RawDetailBundle {
            title_fragment: "Soirée".to_string(),
            date_fragment: "   ".to_string(),
            location_fragment: "Paris".to_string(),
            description_fragment: " \n ".to_string(),
            banner_url: Some(String::new()),
        };
        let record = RecordAssembler::new(&resolver).assemble(link(), &raw, None);
        assert_eq!(record.description_short, None);
        assert_eq!(record.description_long, None);
        assert_eq!(record.image, None);
        assert!(!record.is_complete());
    }

    #[test]
    fn short_description_is_truncated_on_char_boundary() {
        let long = "é".repeat(250);
        let short = short_description(&long).unwrap();
        assert_eq!(short.chars().count(), SHORT_DESCRIPTION_CHARS + 1);
        assert!(short.ends_with('…'));
    }

    #[test]
    fn bundle_deserializes_with_missing_fields() {
        let bundle: RawDetailBundle =
            serde_json::from_str(r#"{"title_fragment": "Tango", "date_fragment": "demain à 20:00"}"#)
                .unwrap();
        assert_eq!(bundle.title_fragment, "Tango");
        assert_eq!(bundle.location_fragment, "");
        assert_eq!(bundle.banner_url, None);
    }
}
