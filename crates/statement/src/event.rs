use chrono::{Datelike, NaiveDate};
use regex::{Regex, RegexBuilder};
use thiserror::Error;

use kassenwart_core::{best_candidate, ConfidenceLevel};

use crate::transaction::{Transaction, TransactionType};

// Recurring title words and the variants participants write them as. The
// table is scanned in this order; the segments of every keyword found in a
// title are concatenated in table order, not title order.
const TITLE_KEYWORDS: &[(&str, &str)] = &[
    ("winter", "Winter"),
    ("sommer", "Sommer"),
    ("pfingst", "Pfingst"),
    ("multi", "Multi(?:nationale)?"),
    ("nachhaltigkeit", "Nachhaltigkeits?"),
    ("junior", "Junior"),
    ("musik", "Musik"),
    ("familien", "Familien"),
    ("ski", "Ski"),
    ("segel", "Segel[nt]?"),
    ("seminar", "Seminar"),
    ("aka", "Aka(?:demie)?"),
    ("freizeit", "Freizeit"),
    ("fahrt", "Fahrt"),
];

const SEGMENT_GAP: &str = r"[-\s]*";

re!(re_four_digit_year, r"(\d\d)(\d\d)");

/// One event as configured: the title participants write on transfers,
/// plus the running dates used to derive year variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub title: String,
    pub begin: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event {title:?} has an unusable title: {source}")]
    BadTitle {
        title: String,
        #[source]
        source: regex::Error,
    },
}

pub(crate) struct CompiledEvent {
    pub(crate) title: String,
    pub(crate) exact: Regex,
    pub(crate) fuzzy: Regex,
}

/// All active events with their match patterns, compiled once.
///
/// Iteration order is the configuration order; ties between events at the
/// same confidence go to the earlier entry.
pub struct EventDirectory {
    events: Vec<CompiledEvent>,
}

impl EventDirectory {
    pub fn new(records: impl IntoIterator<Item = EventRecord>) -> Result<Self, EventError> {
        let mut events = Vec::new();
        for record in records {
            // The uppercased title is compiled as a pattern of its own; a
            // title that does not compile is a configuration error.
            let exact = compile(&record.title.to_uppercase(), &record.title)?;
            let fuzzy = compile(&title_pattern(&record.title, record.begin, record.end), &record.title)?;
            events.push(CompiledEvent {
                title: record.title,
                exact,
                fuzzy,
            });
        }
        Ok(EventDirectory { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Titles with their compiled pattern sources, in directory order.
    pub fn pattern_sources(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.events
            .iter()
            .map(|event| (event.title.as_str(), event.exact.as_str(), event.fuzzy.as_str()))
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, CompiledEvent> {
        self.events.iter()
    }
}

fn compile(pattern: &str, title: &str) -> Result<Regex, EventError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| EventError::BadTitle {
            title: title.to_string(),
            source,
        })
}

/// Fuzzy pattern for an event title: keyword segments in table order, a
/// year segment when the running dates are known, all glued with a
/// hyphen/whitespace-tolerant gap. A title without any known keyword falls
/// back to its literal text with century-optional years.
fn title_pattern(title: &str, begin: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    let lower = title.to_lowercase();
    let mut segments: Vec<String> = TITLE_KEYWORDS
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .map(|(_, replacement)| replacement.to_string())
        .collect();

    if segments.is_empty() {
        let escaped = regex::escape(title);
        return re_four_digit_year()
            .replace_all(&escaped, "(?:${1})?${2}")
            .into_owned();
    }

    if let (Some(begin), Some(end)) = (begin, end) {
        segments.push(year_segment(begin, end));
    }
    segments.join(SEGMENT_GAP)
}

fn year_segment(begin: NaiveDate, end: NaiveDate) -> String {
    let first = short_year(begin);
    let second = short_year(end);
    if first == second {
        first
    } else {
        format!(r"{first}\s*/?\s*{second}")
    }
}

fn short_year(date: NaiveDate) -> String {
    format!("(?:{})?{:02}", date.year() / 100, date.year() % 100)
}

/// All event candidates for one transaction, plus the pick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventOutcome {
    pub candidates: Vec<(String, ConfidenceLevel)>,
    pub best: Option<(String, ConfidenceLevel)>,
}

/// Search the reference for the event the fee belongs to.
pub fn match_event(tx: &Transaction, events: &EventDirectory) -> EventOutcome {
    if tx.transaction_type != TransactionType::EventFee {
        return EventOutcome::default();
    }

    let mut candidates = Vec::new();
    for event in events.iter() {
        if event.exact.is_match(&tx.reference) {
            candidates.push((event.title.clone(), ConfidenceLevel::Full));
        } else if event.fuzzy.is_match(&tx.reference) {
            candidates.push((event.title.clone(), ConfidenceLevel::Full.decrease(1)));
        }
    }
    let best = best_candidate(&candidates);
    EventOutcome { candidates, best }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn record(title: &str, begin: Option<NaiveDate>, end: Option<NaiveDate>) -> EventRecord {
        EventRecord {
            title: title.to_string(),
            begin,
            end,
        }
    }

    fn directory() -> EventDirectory {
        EventDirectory::new([
            record(
                "WinterAkademie 2024/25",
                Some(date(2024, 12, 27)),
                Some(date(2025, 1, 6)),
            ),
            record(
                "SommerAkademie 2024",
                Some(date(2024, 8, 10)),
                Some(date(2024, 8, 24)),
            ),
            record("Segeln", None, None),
        ])
        .unwrap()
    }

    fn tx(reference: &str) -> Transaction {
        Transaction {
            t_id: 1,
            account: Account::Event,
            statement_date: date(2024, 3, 1),
            cents: 15_000,
            reference: reference.to_string(),
            account_holder: String::new(),
            posting: "GUTSCHRIFT".to_string(),
            transaction_type: TransactionType::EventFee,
            type_confidence: Some(ConfidenceLevel::Full),
            member_matches: Vec::new(),
            best_member: None,
            event_matches: Vec::new(),
            best_event: None,
            problems: Vec::new(),
        }
    }

    // ── pattern construction ─────────────────────────────────────────────────

    #[test]
    fn keyword_segments_concatenate_in_table_order() {
        let pattern = title_pattern("WinterAkademie 2024/25", Some(date(2024, 12, 27)), Some(date(2025, 1, 6)));
        assert_eq!(pattern, r"Winter[-\s]*Aka(?:demie)?[-\s]*(?:20)?24\s*/?\s*(?:20)?25");
    }

    #[test]
    fn single_year_events_get_one_year_segment() {
        let pattern = title_pattern("SommerAkademie 2024", Some(date(2024, 8, 10)), Some(date(2024, 8, 24)));
        assert_eq!(pattern, r"Sommer[-\s]*Aka(?:demie)?[-\s]*(?:20)?24");
    }

    #[test]
    fn undated_events_get_no_year_segment() {
        let pattern = title_pattern("Familienfreizeit", None, None);
        assert_eq!(pattern, r"Familien[-\s]*Freizeit");
    }

    #[test]
    fn unknown_titles_fall_back_to_literal_text() {
        let pattern = title_pattern("Chorwochenende 2024", None, None);
        assert_eq!(pattern, "Chorwochenende (?:20)?24");
    }

    // ── match_event ─────────────────────────────────────────────────────────

    #[test]
    fn exact_title_matches_at_full() {
        let outcome = match_event(&tx("Beitrag WinterAkademie 2024/25 Max"), &directory());
        let (title, level) = outcome.best.unwrap();
        assert_eq!(title, "WinterAkademie 2024/25");
        assert_eq!(level, ConfidenceLevel::Full);
    }

    #[test]
    fn fuzzy_variants_match_one_level_down() {
        for reference in ["Winteraka 24/25", "WINTER-AKADEMIE 2024 / 2025", "winterakademie 2425"] {
            let outcome = match_event(&tx(reference), &directory());
            let (title, level) = outcome.best.expect(reference);
            assert_eq!(title, "WinterAkademie 2024/25", "{reference}");
            assert_eq!(level, ConfidenceLevel::High, "{reference}");
        }
    }

    #[test]
    fn exact_beats_fuzzy_across_events() {
        // Fuzzy hit on the winter event, exact hit on the summer one: the
        // exact hit wins even though the winter event is listed first.
        let outcome = match_event(&tx("Winteraka 24/25 und SommerAkademie 2024"), &directory());

        assert_eq!(outcome.candidates.len(), 2);
        let (title, level) = outcome.best.unwrap();
        assert_eq!(title, "SommerAkademie 2024");
        assert_eq!(level, ConfidenceLevel::Full);
    }

    #[test]
    fn ties_keep_the_earlier_event() {
        let outcome = match_event(&tx("WinterAkademie 2024/25 und SommerAkademie 2024"), &directory());
        let (title, _) = outcome.best.unwrap();
        assert_eq!(title, "WinterAkademie 2024/25");
    }

    #[test]
    fn non_event_fees_never_match() {
        let mut other = tx("WinterAkademie 2024/25");
        other.transaction_type = TransactionType::Other;
        assert_eq!(match_event(&other, &directory()), EventOutcome::default());
    }

    #[test]
    fn unmatched_references_yield_nothing() {
        let outcome = match_event(&tx("Spende"), &directory());
        assert_eq!(outcome.best, None);
        assert!(outcome.candidates.is_empty());
    }

    #[test]
    fn broken_title_pattern_is_a_directory_error() {
        let result = EventDirectory::new([record("Sommer(fest", None, None)]);
        assert!(matches!(result, Err(EventError::BadTitle { .. })));
    }
}
