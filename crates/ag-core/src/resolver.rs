//! Date phrase resolution.
//!
//! Turns a free-text timing phrase ("samedi de 20:00 à 01:30",
//! "du 18 déc. 20:00 au 22 déc. 03:00") into an absolute interval anchored
//! to a caller-supplied reference instant.
//!
//! # Cascade
//!
//! Phrases are classified by an ordered list of rules. The first rule whose
//! pattern matches decides the outcome, even when its computation then fails:
//!
//! 1. [`GrammarCase::ExplicitRange`] - `du 18 déc. 20:00 au 22 déc. 03:00`
//! 2. [`GrammarCase::ExplicitDate`] - `vendredi 19 septembre 2025 à 21:00`
//! 3. [`GrammarCase::RelativeDay`] - `samedi à 20:00`, `demain à 20:00`
//! 4. [`GrammarCase::TimeSpan`] - `samedi de 20:00 à 01:30`
//!
//! Rules overlap, so the order is part of the contract.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::{Captures, Regex};

use crate::types::ResolvedInterval;
use crate::vocabulary::Vocabulary;

/// A clock time such as `20:00` or `9:30`, not glued to further digits.
const CLOCK: &str = r"(?-u:\b)(\d{1,2}:\d{2})(?-u:\b)";

/// A month or weekday token, possibly abbreviated with a dot.
const WORD: &str = r"([\p{L}.]+)";

/// One recognized phrase shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarCase {
    /// Two day/month/time endpoints: "from 18 Dec 20:00 to 22 Dec 03:00".
    ExplicitRange,
    /// A fully qualified date with a time: "Friday 19 September 2025 at 21:00".
    ExplicitDate,
    /// A weekday name or "tomorrow" with a time: "saturday at 20:00".
    RelativeDay,
    /// A clock-time span on an implied or named day: "saturday from 20:00 to 01:30".
    TimeSpan,
}

impl GrammarCase {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ExplicitRange => "explicit_range",
            Self::ExplicitDate => "explicit_date",
            Self::RelativeDay => "relative_day",
            Self::TimeSpan => "time_span",
        }
    }
}

impl fmt::Display for GrammarCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

type ResolveFn =
    fn(&PhraseResolver, &Captures<'_>, &str, NaiveDateTime) -> Option<ResolvedInterval>;

struct Rule {
    case: GrammarCase,
    pattern: Regex,
    resolve: ResolveFn,
}

/// Resolves date phrases written in one [`Vocabulary`].
///
/// Resolution is pure: the same phrase and reference always give the same
/// answer, and malformed input yields `None` rather than an error.
pub struct PhraseResolver {
    vocabulary: Vocabulary,
    rules: Vec<Rule>,
    calendar_date: Regex,
    weekday_word: Regex,
    tomorrow_word: Regex,
}

impl fmt::Debug for PhraseResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhraseResolver")
            .field("vocabulary", &self.vocabulary)
            .field(
                "cases",
                &self.rules.iter().map(|rule| rule.case).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl PhraseResolver {
    /// Compiles the phrase grammar for `vocabulary`.
    pub fn new(vocabulary: Vocabulary) -> Result<Self, regex::Error> {
        let weekdays = alternation(vocabulary.weekday_names());
        let days = alternation(
            std::iter::once(vocabulary.tomorrow()).chain(vocabulary.weekday_names()),
        );
        let at = regex::escape(vocabulary.at());
        let from = regex::escape(vocabulary.range_from());
        let to = regex::escape(vocabulary.range_to());
        let until = regex::escape(vocabulary.until());

        let rules = vec![
            Rule {
                case: GrammarCase::ExplicitRange,
                pattern: Regex::new(&format!(
                    r"\b{from}\s+(\d{{1,2}})\s+{WORD}\s+{CLOCK}\s+{to}\s+(\d{{1,2}})\s+{WORD}\s+{CLOCK}"
                ))?,
                resolve: Self::explicit_range,
            },
            Rule {
                case: GrammarCase::ExplicitDate,
                pattern: Regex::new(&format!(
                    r"\b(\d{{1,2}})\s+{WORD}\s+(\d{{4}})\s+{at}\s+{CLOCK}"
                ))?,
                resolve: Self::explicit_date,
            },
            Rule {
                case: GrammarCase::RelativeDay,
                pattern: Regex::new(&format!(r"\b({days})\s*{at}\s*{CLOCK}"))?,
                resolve: Self::relative_day,
            },
            Rule {
                case: GrammarCase::TimeSpan,
                pattern: Regex::new(&format!(r"{CLOCK}\s*{until}\s*{CLOCK}"))?,
                resolve: Self::time_span,
            },
        ];

        Ok(Self {
            calendar_date: Regex::new(&format!(r"\b(\d{{1,2}})\s+{WORD}\s+(\d{{4}})\b"))?,
            weekday_word: Regex::new(&format!(r"\b({weekdays})\b"))?,
            tomorrow_word: Regex::new(&format!(r"\b{}\b", regex::escape(vocabulary.tomorrow())))?,
            vocabulary,
            rules,
        })
    }

    /// The vocabulary this resolver was built with.
    pub const fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Which grammar case a phrase falls in, without resolving it.
    pub fn classify(&self, phrase: &str) -> Option<GrammarCase> {
        let text = normalize(phrase);
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(&text))
            .map(|rule| rule.case)
    }

    /// Resolves `phrase` relative to `reference`.
    ///
    /// Returns `None` when no case matches or when the matched case names an
    /// impossible date (31 février, 25:00, an unknown month).
    pub fn resolve(&self, phrase: &str, reference: NaiveDateTime) -> Option<ResolvedInterval> {
        let text = normalize(phrase);
        let (rule, caps) = self
            .rules
            .iter()
            .find_map(|rule| rule.pattern.captures(&text).map(|caps| (rule, caps)))?;

        let resolved = (rule.resolve)(self, &caps, &text, reference);
        if resolved.is_none() {
            tracing::debug!(case = %rule.case, phrase = %text, "phrase matched but names no valid date");
        }
        resolved
    }

    /// `du 18 déc. 20:00 au 22 déc. 03:00`
    ///
    /// Both endpoints take the reference year. An end before the start rolls
    /// the end into the next year; a start before the reference rolls both.
    fn explicit_range(
        &self,
        caps: &Captures<'_>,
        _text: &str,
        reference: NaiveDateTime,
    ) -> Option<ResolvedInterval> {
        let year = reference.year();
        let mut start = self.date_time(&caps[1], &caps[2], year, &caps[3])?;
        let mut end = self.date_time(&caps[4], &caps[5], year, &caps[6])?;

        if end < start {
            end = shift_year(end)?;
        }
        if start < reference {
            start = shift_year(start)?;
            end = shift_year(end)?;
        }
        ResolvedInterval::new(start, end)
    }

    /// `vendredi 19 septembre 2025 à 21:00` (weekday name is ignored)
    fn explicit_date(
        &self,
        caps: &Captures<'_>,
        _text: &str,
        _reference: NaiveDateTime,
    ) -> Option<ResolvedInterval> {
        let year = caps[3].parse().ok()?;
        let at = self.date_time(&caps[1], &caps[2], year, &caps[4])?;
        Some(ResolvedInterval::instant(at))
    }

    /// `samedi à 20:00`, `demain à 20:00`
    fn relative_day(
        &self,
        caps: &Captures<'_>,
        _text: &str,
        reference: NaiveDateTime,
    ) -> Option<ResolvedInterval> {
        let today = reference.date();
        let date = if &caps[1] == self.vocabulary.tomorrow() {
            today.checked_add_days(Days::new(1))?
        } else {
            next_occurrence(today, self.vocabulary.weekday(&caps[1])?)?
        };
        Some(ResolvedInterval::instant(date.and_time(parse_clock(&caps[2])?)))
    }

    /// `samedi de 20:00 à 01:30`, `demain de 19:00 à 23:00`
    ///
    /// The day is, by preference: an explicit calendar date anywhere in the
    /// phrase, then "tomorrow", then a weekday name, then the reference day.
    /// An end at or before the start wraps past midnight.
    fn time_span(
        &self,
        caps: &Captures<'_>,
        text: &str,
        reference: NaiveDateTime,
    ) -> Option<ResolvedInterval> {
        let opens = parse_clock(&caps[1])?;
        let closes = parse_clock(&caps[2])?;

        let today = reference.date();
        let date = if let Some(explicit) = self.calendar_date.captures(text) {
            self.date(&explicit[1], &explicit[2], explicit[3].parse().ok()?)?
        } else if self.tomorrow_word.is_match(text) {
            today.checked_add_days(Days::new(1))?
        } else if let Some(named) = self.weekday_word.captures(text) {
            next_occurrence(today, self.vocabulary.weekday(&named[1])?)?
        } else {
            today
        };

        let start = date.and_time(opens);
        let mut end = date.and_time(closes);
        if end <= start {
            end = end.checked_add_days(Days::new(1))?;
        }
        ResolvedInterval::new(start, end)
    }

    fn date(&self, day: &str, month: &str, year: i32) -> Option<NaiveDate> {
        let day = day.parse().ok()?;
        let month = self.vocabulary.month(month)?;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    fn date_time(&self, day: &str, month: &str, year: i32, clock: &str) -> Option<NaiveDateTime> {
        Some(self.date(day, month, year)?.and_time(parse_clock(clock)?))
    }
}

fn normalize(phrase: &str) -> String {
    phrase.trim().to_lowercase()
}

fn alternation<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words.map(regex::escape).collect::<Vec<_>>().join("|")
}

/// Parses a 24-hour `HH:MM` clock value.
fn parse_clock(clock: &str) -> Option<NaiveTime> {
    let (hour, minute) = clock.split_once(':')?;
    NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)
}

/// Same wall-clock instant one year later; `None` for 29 February.
fn shift_year(at: NaiveDateTime) -> Option<NaiveDateTime> {
    at.with_year(at.year() + 1)
}

/// The first `day` on or after `from` (zero days ahead if `from` is that day).
/// `None` past the end of the calendar.
fn next_occurrence(from: NaiveDate, day: Weekday) -> Option<NaiveDate> {
    let ahead = (7 + day.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    from.checked_add_days(Days::new(u64::from(ahead)))
}
