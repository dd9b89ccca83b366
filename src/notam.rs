//! NOTAM decoding and analysis
//!
//! CFPS ships each NOTAM as a JSON document whose `raw` field holds the
//! human-readable ICAO text. This module turns those payloads into display
//! text and, for the detail view, classifies them, reads their validity
//! window, hides noise, and removes duplicate publications.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDateTime};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::models::{OrganizedReports, ReportCategory};

static PPR_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bPPR\b").expect("valid PPR regex"));
static ITEM_B: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bB\)\s*(\d{10}|PERM)").expect("valid item B regex"));
static ITEM_C: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bC\)\s*(\d{10}|PERM)").expect("valid item C regex"));
static SERIAL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2}/\d{3}\b").expect("valid serial regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const RUNWAY_KEYWORDS: [&str; 2] = ["RWY", "RUNWAY"];
const AIRSPACE_KEYWORDS: [&str; 6] = ["SID", "STAR", "APPROACH", "AIRSPACE", "NAVIGATION", "FDC"];
const SERVICE_KEYWORDS: [&str; 4] = ["TOWER", "APRON", "GROUND", "SERVICE"];

/// Closure words marked in the detail view
pub const HIGHLIGHT_KEYWORDS: [&str; 2] = ["CLOSED", "CLSD"];

/// Extract the `raw` rendering from a JSON-encoded NOTAM.
///
/// Returns `None` when the text is not JSON, not an object, or has no string
/// `raw` field.
#[must_use]
pub fn decode_notam_raw(text: &str) -> Option<String> {
    let document: Value = serde_json::from_str(text).ok()?;
    document.get("raw")?.as_str().map(str::to_owned)
}

/// Text to show for a NOTAM: the decoded `raw` field, or the payload verbatim
#[must_use]
pub fn display_text(text: &str) -> String {
    decode_notam_raw(text).unwrap_or_else(|| text.to_string())
}

/// Operational grouping used to order the detail view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NotamCategory {
    Runway,
    Ppr,
    AirspaceNavigation,
    AirportServices,
    Other,
}

impl NotamCategory {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            NotamCategory::Runway => "Runway",
            NotamCategory::Ppr => "PPR",
            NotamCategory::AirspaceNavigation => "Airspace/Navigation",
            NotamCategory::AirportServices => "Airport Services",
            NotamCategory::Other => "Other",
        }
    }

    /// Display priority, lowest first
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            NotamCategory::Runway => 0,
            NotamCategory::Ppr => 1,
            NotamCategory::AirspaceNavigation => 2,
            NotamCategory::AirportServices => 3,
            NotamCategory::Other => 4,
        }
    }
}

impl fmt::Display for NotamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a NOTAM by keywords. PPR wins over runway mentions.
#[must_use]
pub fn categorize(text: &str) -> NotamCategory {
    let upper = text.to_uppercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|kw| upper.contains(kw));

    if PPR_WORD.is_match(&upper) {
        NotamCategory::Ppr
    } else if contains_any(&RUNWAY_KEYWORDS) {
        NotamCategory::Runway
    } else if contains_any(&AIRSPACE_KEYWORDS) {
        NotamCategory::AirspaceNavigation
    } else if contains_any(&SERVICE_KEYWORDS) {
        NotamCategory::AirportServices
    } else {
        NotamCategory::Other
    }
}

/// One end of a NOTAM validity window (ICAO items B and C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Validity {
    /// UTC timestamp
    At(NaiveDateTime),
    Permanent,
    Unknown,
}

impl Validity {
    fn parse(token: &str) -> Self {
        if token == "PERM" {
            return Validity::Permanent;
        }
        NaiveDateTime::parse_from_str(token, "%y%m%d%H%M")
            .map(Validity::At)
            .unwrap_or(Validity::Unknown)
    }

    #[must_use]
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Validity::At(at) => Some(*at),
            _ => None,
        }
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validity::At(at) => write!(f, "{}", at.format("%b %d %Y, %H:%MZ")),
            Validity::Permanent => f.write_str("PERM"),
            Validity::Unknown => f.write_str("N/A"),
        }
    }
}

/// Read the `B)` start and `C)` end items of an ICAO-format NOTAM
#[must_use]
pub fn parse_validity(text: &str) -> (Validity, Validity) {
    let item = |pattern: &Regex| {
        pattern
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map_or(Validity::Unknown, |token| Validity::parse(token.as_str()))
    };
    (item(&ITEM_B), item(&ITEM_C))
}

/// True when the NOTAM mentions any of the hide keywords (case-insensitive)
#[must_use]
pub fn is_hidden(text: &str, hide_keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    hide_keywords
        .iter()
        .any(|keyword| lower.contains(&keyword.to_lowercase()))
}

/// True when no terms are given or any term occurs in the text (case-insensitive)
#[must_use]
pub fn matches_filter(text: &str, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let lower = text.to_lowercase();
    terms.iter().any(|term| lower.contains(&term.to_lowercase()))
}

/// Text with the series/serial numbers and layout noise removed, so that
/// replacement publications of the same NOTAM compare equal
#[must_use]
pub fn normalize_for_dedup(text: &str) -> String {
    let text = text.trim_start_matches('!').trim();
    let text = SERIAL_NUMBER.replace_all(text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// A decoded NOTAM prepared for the detail view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotamEntry {
    pub text: String,
    pub category: NotamCategory,
    pub start: Validity,
    pub end: Validity,
}

impl NotamEntry {
    /// Build an entry from an API payload (JSON-encoded or plain)
    #[must_use]
    pub fn from_payload(payload: &str) -> Self {
        let text = display_text(payload);
        let category = categorize(&text);
        let (start, end) = parse_validity(&text);
        Self {
            text,
            category,
            start,
            end,
        }
    }

    /// Duration between start and end, when both are timestamps
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        Some(self.end.timestamp()? - self.start.timestamp()?)
    }

    /// Time left until the end of validity, `None` for PERM or unknown ends
    #[must_use]
    pub fn remaining(&self, now: NaiveDateTime) -> Option<Remaining> {
        let left = self.end.timestamp()? - now;
        Some(if left > Duration::zero() {
            Remaining::Left(left)
        } else {
            Remaining::Expired
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Left(Duration),
    Expired,
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remaining::Left(left) => write!(f, "(in {})", format_duration(*left)),
            Remaining::Expired => f.write_str("(expired)"),
        }
    }
}

/// `95 minutes` as `1h35m`
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    format!("{}h{:02}m", minutes / 60, minutes % 60)
}

/// Wrap the closure keywords and the given search terms in `*...*`.
///
/// Matching is case-insensitive and the original casing is kept.
#[must_use]
pub fn highlight(text: &str, terms: &[String]) -> String {
    let mut needles: Vec<&str> = HIGHLIGHT_KEYWORDS
        .iter()
        .copied()
        .chain(terms.iter().map(|term| term.trim()))
        .filter(|needle| !needle.is_empty())
        .collect();
    // longest first so a term containing a keyword wins
    needles.sort_by_key(|needle| std::cmp::Reverse(needle.len()));

    let pattern = needles
        .iter()
        .map(|needle| regex::escape(needle))
        .collect::<Vec<_>>()
        .join("|");
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(regex) => regex.replace_all(text, "*${0}*").into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Merge entries that are the same NOTAM published more than once.
///
/// The longest text of each group is kept, at the position where the group
/// was first seen.
#[must_use]
pub fn deduplicate(entries: Vec<NotamEntry>) -> Vec<NotamEntry> {
    let mut kept: Vec<NotamEntry> = Vec::with_capacity(entries.len());
    let mut seen: HashMap<(String, Validity, Validity), usize> = HashMap::new();

    for entry in entries {
        let key = (normalize_for_dedup(&entry.text), entry.start, entry.end);
        match seen.get(&key) {
            Some(&index) => {
                if entry.text.len() > kept[index].text.len() {
                    kept[index] = entry;
                }
            }
            None => {
                seen.insert(key, kept.len());
                kept.push(entry);
            }
        }
    }
    kept
}

/// Order by category priority, then by start time (undated entries first)
pub fn sort_for_display(entries: &mut [NotamEntry]) {
    entries.sort_by(|a, b| match a.category.rank().cmp(&b.category.rank()) {
        Ordering::Equal => a.start.timestamp().cmp(&b.start.timestamp()),
        other => other,
    });
}

/// Settings for the NOTAM detail view
#[derive(Debug, Clone, Default)]
pub struct NotamOptions {
    /// NOTAMs mentioning any of these are dropped
    pub hide_keywords: Vec<String>,
    /// When non-empty, only NOTAMs mentioning one of these are kept
    pub filter_terms: Vec<String>,
}

/// Decode, hide, deduplicate, filter and sort the NOTAMs of one airport
#[must_use]
pub fn prepare_for_display(reports: &OrganizedReports, options: &NotamOptions) -> Vec<NotamEntry> {
    let entries: Vec<NotamEntry> = reports
        .get(ReportCategory::Notam)
        .iter()
        .map(|report| NotamEntry::from_payload(&report.text))
        .filter(|entry| !is_hidden(&entry.text, &options.hide_keywords))
        .collect();

    let mut entries: Vec<NotamEntry> = deduplicate(entries)
        .into_iter()
        .filter(|entry| matches_filter(&entry.text, &options.filter_terms))
        .collect();
    sort_for_display(&mut entries);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Report;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Validity {
        Validity::At(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_decode_raw_field() {
        assert_eq!(
            decode_notam_raw(r#"{"raw":"A1234/23 RWY CLOSED"}"#),
            Some("A1234/23 RWY CLOSED".to_string())
        );
        assert_eq!(display_text(r#"{"raw":"A1234/23 RWY CLOSED"}"#), "A1234/23 RWY CLOSED");
    }

    #[rstest]
    #[case("plain text")]
    #[case(r#"{"english":"no raw here"}"#)]
    #[case(r#"{"raw":42}"#)]
    #[case(r#"["raw"]"#)]
    #[case(r#""just a string""#)]
    #[case(r#"{"raw": "unterminated"#)]
    fn test_display_text_falls_back_verbatim(#[case] payload: &str) {
        assert_eq!(decode_notam_raw(payload), None);
        assert_eq!(display_text(payload), payload);
    }

    #[rstest]
    #[case("CYYC RWY 17L/35R CLSD", NotamCategory::Runway)]
    #[case("CYBW PPR 24 HR FOR ALL ACFT, RWY 07/25", NotamCategory::Ppr)]
    #[case("CYBW APPROPRIATE CHARGES", NotamCategory::Other)]
    #[case("CYVR RNAV (GNSS) APPROACH RWY 08L NOT AVBL", NotamCategory::Runway)]
    #[case("CYVR STAR CANUCK2 NOT AVBL", NotamCategory::AirspaceNavigation)]
    #[case("cyeg apron ii closed", NotamCategory::AirportServices)]
    #[case("CYEG BIRD ACTIVITY", NotamCategory::Other)]
    fn test_categorize(#[case] text: &str, #[case] expected: NotamCategory) {
        assert_eq!(categorize(text), expected);
    }

    #[test]
    fn test_parse_validity_timestamps() {
        let text = "A0123/25 NOTAMN Q) CZEG/QMRLC A) CYEG B) 2501011200 C) 2501021800 E) RWY 12/30 CLSD";
        assert_eq!(
            parse_validity(text),
            (at(2025, 1, 1, 12, 0), at(2025, 1, 2, 18, 0))
        );
    }

    #[test]
    fn test_parse_validity_perm_and_missing() {
        assert_eq!(
            parse_validity("B) 2503150000 C) PERM"),
            (at(2025, 3, 15, 0, 0), Validity::Permanent)
        );
        assert_eq!(
            parse_validity("CYYC TWY C CLSD"),
            (Validity::Unknown, Validity::Unknown)
        );
        assert_eq!(
            parse_validity("B) 2513400000"),
            (Validity::Unknown, Validity::Unknown)
        );
    }

    #[test]
    fn test_validity_display() {
        assert_eq!(at(2025, 1, 2, 18, 5).to_string(), "Jan 02 2025, 18:05Z");
        assert_eq!(Validity::Permanent.to_string(), "PERM");
        assert_eq!(Validity::Unknown.to_string(), "N/A");
    }

    #[test]
    fn test_duration() {
        let entry = NotamEntry::from_payload("B) 2501011200 C) 2501021800 RWY CLSD");
        assert_eq!(entry.duration(), Some(Duration::hours(30)));
        let perm = NotamEntry::from_payload("B) 2501011200 C) PERM RWY CLSD");
        assert_eq!(perm.duration(), None);
    }

    #[test]
    fn test_is_hidden() {
        let hide = vec!["crane".to_string(), "OBST TOWER".to_string()];
        assert!(is_hidden("CYYC CRANE 350FT AGL", &hide));
        assert!(is_hidden("cyyc obst tower lgt u/s", &hide));
        assert!(!is_hidden("CYYC RWY 17L CLSD", &hide));
        assert!(!is_hidden("anything", &[]));
    }

    #[test]
    fn test_matches_filter() {
        let terms = vec!["clsd".to_string(), "ppr".to_string()];
        assert!(matches_filter("RWY 08 CLSD", &terms));
        assert!(!matches_filter("TWY A LGT U/S", &terms));
        assert!(matches_filter("TWY A LGT U/S", &[]));
    }

    #[test]
    fn test_normalize_for_dedup() {
        assert_eq!(
            normalize_for_dedup("!CYYC 12/345   CYYC RWY 17L\n CLSD "),
            "CYYC CYYC RWY 17L CLSD"
        );
    }

    #[test]
    fn test_deduplicate_keeps_longest_in_first_position() {
        let entries = vec![
            NotamEntry::from_payload("!CYYC 01/234 RWY 17L CLSD"),
            NotamEntry::from_payload("CYYC TWY B CLSD"),
            NotamEntry::from_payload("!CYYC 05/678   RWY 17L CLSD"),
        ];
        let deduped = deduplicate(entries);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].text, "!CYYC 05/678   RWY 17L CLSD");
        assert_eq!(deduped[1].text, "CYYC TWY B CLSD");
    }

    #[test]
    fn test_deduplicate_respects_validity() {
        let entries = vec![
            NotamEntry::from_payload("RWY 17L CLSD B) 2501011200 C) 2501011800"),
            NotamEntry::from_payload("RWY 17L CLSD B) 2501021200 C) 2501021800"),
        ];
        assert_eq!(deduplicate(entries).len(), 2);
    }

    #[test]
    fn test_sort_for_display() {
        let mut entries = vec![
            NotamEntry::from_payload("BIRD ACTIVITY"),
            NotamEntry::from_payload("RWY 08 CLSD B) 2502011200"),
            NotamEntry::from_payload("PPR 24 HR"),
            NotamEntry::from_payload("RWY 26 CLSD B) 2501011200"),
            NotamEntry::from_payload("RWY 12 LGT U/S"),
        ];
        sort_for_display(&mut entries);
        let texts: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "RWY 12 LGT U/S",
                "RWY 26 CLSD B) 2501011200",
                "RWY 08 CLSD B) 2502011200",
                "PPR 24 HR",
                "BIRD ACTIVITY",
            ]
        );
    }

    #[test]
    fn test_prepare_for_display() {
        let reports = OrganizedReports::organize(vec![
            Report::new("notam", r#"{"raw":"CYYC CRANE 300FT AGL"}"#),
            Report::new("notam", r#"{"raw":"CYYC 01/111 TWY C CLSD"}"#),
            Report::new("notam", r#"{"raw":"CYYC 01/112 TWY C CLSD"}"#),
            Report::new("notam", r#"{"raw":"CYYC RWY 17L/35R CLSD"}"#),
            Report::new("metar", "METAR CYYC"),
        ]);
        let options = NotamOptions {
            hide_keywords: vec!["crane".to_string()],
            filter_terms: Vec::new(),
        };

        let entries = prepare_for_display(&reports, &options);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].category, NotamCategory::Runway);
        assert_eq!(entries[1].text, "CYYC 01/111 TWY C CLSD");

        let filtered = prepare_for_display(
            &reports,
            &NotamOptions {
                filter_terms: vec!["twy".to_string()],
                ..options
            },
        );
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_remaining() {
        let entry = NotamEntry::from_payload("B) 2501011200 C) 2501021800 RWY CLSD");
        let Validity::At(noon) = at(2025, 1, 2, 12, 30) else {
            unreachable!()
        };
        assert_eq!(
            entry.remaining(noon),
            Some(Remaining::Left(Duration::minutes(330)))
        );
        assert_eq!(entry.remaining(noon).unwrap().to_string(), "(in 5h30m)");

        let Validity::At(later) = at(2025, 1, 3, 0, 0) else {
            unreachable!()
        };
        assert_eq!(entry.remaining(later), Some(Remaining::Expired));
        assert_eq!(Remaining::Expired.to_string(), "(expired)");

        let perm = NotamEntry::from_payload("B) 2501011200 C) PERM RWY CLSD");
        assert_eq!(perm.remaining(later), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::minutes(95)), "1h35m");
        assert_eq!(format_duration(Duration::hours(30)), "30h00m");
    }

    #[rstest]
    #[case("CYYC RWY 17L CLSD", &[], "CYYC RWY 17L *CLSD*")]
    #[case("TWY B CLOSED", &[], "TWY B *CLOSED*")]
    #[case("cyyc rwy 08 clsd", &["RWY"], "cyyc *rwy* 08 *clsd*")]
    #[case("APRON 2 AVBL", &["apron 2", " "], "*APRON 2* AVBL")]
    #[case("PPR 24 HR", &[], "PPR 24 HR")]
    fn test_highlight(#[case] text: &str, #[case] terms: &[&str], #[case] expected: &str) {
        let terms: Vec<String> = terms.iter().map(|term| term.to_string()).collect();
        assert_eq!(highlight(text, &terms), expected);
    }

    #[test]
    fn test_highlight_escapes_terms() {
        let terms = vec!["17L/35R (".to_string()];
        assert_eq!(highlight("RWY 17L/35R (TEMP)", &terms), "RWY *17L/35R (*TEMP)");
    }
}
