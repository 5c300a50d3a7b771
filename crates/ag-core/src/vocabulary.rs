//! Month and weekday names for one phrase language.
//!
//! A [`Vocabulary`] is handed to the resolver at construction time. Nothing
//! here is global, so resolvers for different languages can coexist.

use std::collections::HashMap;

use chrono::Weekday;

use crate::types::Locale;

/// Words the phrase grammar is built from.
///
/// All names are stored lowercase. Month lookups ignore a trailing dot so
/// both `déc.` and `déc` resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    months: HashMap<String, u32>,
    weekdays: Vec<(String, Weekday)>,
    tomorrow: String,
    at: String,
    range_from: String,
    range_to: String,
    until: String,
}

impl Vocabulary {
    /// Builds a vocabulary from raw tables.
    ///
    /// `weekdays` must name each day once; the first name listed for a day is
    /// used when displaying it.
    pub fn new<M, W, S>(months: M, weekdays: W, tomorrow: S, at: S, range: (S, S), until: S) -> Self
    where
        M: IntoIterator<Item = (S, u32)>,
        W: IntoIterator<Item = (S, Weekday)>,
        S: Into<String>,
    {
        Self {
            months: months
                .into_iter()
                .map(|(name, number)| (name.into().to_lowercase(), number))
                .collect(),
            weekdays: weekdays
                .into_iter()
                .map(|(name, day)| (name.into().to_lowercase(), day))
                .collect(),
            tomorrow: tomorrow.into().to_lowercase(),
            at: at.into().to_lowercase(),
            range_from: range.0.into().to_lowercase(),
            range_to: range.1.into().to_lowercase(),
            until: until.into().to_lowercase(),
        }
    }

    /// Built-in vocabulary for a locale.
    #[must_use]
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::French => Self::french(),
            Locale::English => Self::english(),
        }
    }

    /// French month and weekday names, including the short forms used on
    /// event listings (`janv.`, `sept.`, `déc.`).
    #[must_use]
    pub fn french() -> Self {
        Self::new(
            [
                ("janvier", 1),
                ("février", 2),
                ("mars", 3),
                ("avril", 4),
                ("mai", 5),
                ("juin", 6),
                ("juillet", 7),
                ("août", 8),
                ("septembre", 9),
                ("octobre", 10),
                ("novembre", 11),
                ("décembre", 12),
                ("janv", 1),
                ("févr", 2),
                ("mar", 3),
                ("avr", 4),
                ("juil", 7),
                ("sept", 9),
                ("oct", 10),
                ("nov", 11),
                ("déc", 12),
            ],
            [
                ("lundi", Weekday::Mon),
                ("mardi", Weekday::Tue),
                ("mercredi", Weekday::Wed),
                ("jeudi", Weekday::Thu),
                ("vendredi", Weekday::Fri),
                ("samedi", Weekday::Sat),
                ("dimanche", Weekday::Sun),
            ],
            "demain",
            "à",
            ("du", "au"),
            "à",
        )
    }

    /// English month and weekday names.
    #[must_use]
    pub fn english() -> Self {
        Self::new(
            [
                ("january", 1),
                ("february", 2),
                ("march", 3),
                ("april", 4),
                ("may", 5),
                ("june", 6),
                ("july", 7),
                ("august", 8),
                ("september", 9),
                ("october", 10),
                ("november", 11),
                ("december", 12),
                ("jan", 1),
                ("feb", 2),
                ("mar", 3),
                ("apr", 4),
                ("jun", 6),
                ("jul", 7),
                ("aug", 8),
                ("sep", 9),
                ("sept", 9),
                ("oct", 10),
                ("nov", 11),
                ("dec", 12),
            ],
            [
                ("monday", Weekday::Mon),
                ("tuesday", Weekday::Tue),
                ("wednesday", Weekday::Wed),
                ("thursday", Weekday::Thu),
                ("friday", Weekday::Fri),
                ("saturday", Weekday::Sat),
                ("sunday", Weekday::Sun),
            ],
            "tomorrow",
            "at",
            ("from", "to"),
            "to",
        )
    }

    /// Month number for a (possibly abbreviated) month name.
    pub fn month(&self, name: &str) -> Option<u32> {
        let key = name.trim().trim_end_matches('.').to_lowercase();
        self.months.get(&key).copied()
    }

    /// Weekday for an exact weekday name.
    pub fn weekday(&self, name: &str) -> Option<Weekday> {
        let key = name.trim().to_lowercase();
        self.weekdays
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, day)| *day)
    }

    /// Display name for a weekday, capitalized (`Samedi`, `Saturday`).
    pub fn weekday_name(&self, day: Weekday) -> Option<String> {
        let (name, _) = self.weekdays.iter().find(|(_, d)| *d == day)?;
        let mut chars = name.chars();
        let first = chars.next()?;
        Some(first.to_uppercase().chain(chars).collect())
    }

    pub(crate) fn weekday_names(&self) -> impl Iterator<Item = &str> {
        self.weekdays.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn tomorrow(&self) -> &str {
        &self.tomorrow
    }

    pub(crate) fn at(&self) -> &str {
        &self.at
    }

    pub(crate) fn range_from(&self) -> &str {
        &self.range_from
    }

    pub(crate) fn range_to(&self) -> &str {
        &self.range_to
    }

    /// Connective between the two clock times of a span (`à`, `to`).
    pub fn until(&self) -> &str {
        &self.until
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::french()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn french_months_accept_abbreviations_and_dots() {
        let vocab = Vocabulary::french();
        assert_eq!(vocab.month("décembre"), Some(12));
        assert_eq!(vocab.month("déc."), Some(12));
        assert_eq!(vocab.month("Sept."), Some(9));
        assert_eq!(vocab.month("mar"), Some(3));
        assert_eq!(vocab.month("brumaire"), None);
    }

    #[test]
    fn english_months() {
        let vocab = Vocabulary::english();
        assert_eq!(vocab.month("Dec"), Some(12));
        assert_eq!(vocab.month("september"), Some(9));
        assert_eq!(vocab.month("décembre"), None);
    }

    #[test]
    fn weekday_lookup_and_display() {
        let vocab = Vocabulary::french();
        assert_eq!(vocab.weekday("Samedi"), Some(Weekday::Sat));
        assert_eq!(vocab.weekday("sam"), None);
        assert_eq!(vocab.weekday_name(Weekday::Sat).as_deref(), Some("Samedi"));

        let vocab = Vocabulary::english();
        assert_eq!(vocab.weekday_name(Weekday::Wed).as_deref(), Some("Wednesday"));
    }

    #[test]
    fn for_locale_picks_builtin() {
        assert_eq!(Vocabulary::for_locale(Locale::French), Vocabulary::french());
        assert_eq!(Vocabulary::for_locale(Locale::English), Vocabulary::english());
    }
}
