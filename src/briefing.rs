//! Batch briefing
//!
//! Runs the fetch-and-organize pipeline for a list of airports, one after the
//! other. A failing airport is reported and skipped; it never stops the batch.

use serde::Serialize;
use tracing::{info, warn};

use crate::api::ReportSource;
use crate::models::{AirportCode, OrganizedReports, ResultRow};

/// Reports retrieved for one airport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportBriefing {
    pub code: AirportCode,
    pub reports: OrganizedReports,
}

impl AirportBriefing {
    #[must_use]
    pub fn to_row(&self) -> ResultRow {
        ResultRow::from_reports(self.code.clone(), &self.reports)
    }
}

/// An airport that could not be briefed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchWarning {
    pub code: AirportCode,
    pub message: String,
}

/// Successful briefings in input order, plus what went wrong
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub briefings: Vec<AirportBriefing>,
    pub warnings: Vec<FetchWarning>,
}

impl BatchOutcome {
    /// Summary rows, one per successful airport
    #[must_use]
    pub fn rows(&self) -> Vec<ResultRow> {
        self.briefings.iter().map(AirportBriefing::to_row).collect()
    }
}

/// Fetch every code in turn, collecting successes and warnings
pub fn process_batch<S: ReportSource + ?Sized>(source: &S, codes: &[AirportCode]) -> BatchOutcome {
    info!("Fetching reports for {} airport(s)", codes.len());

    let mut outcome = BatchOutcome::default();
    for code in codes {
        match source.fetch(code) {
            Ok(reports) => outcome.briefings.push(AirportBriefing {
                code: code.clone(),
                reports,
            }),
            Err(e) => {
                warn!("Failed to fetch data for {}: {}", code, e);
                outcome.warnings.push(FetchWarning {
                    code: code.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        "Briefed {} airport(s), {} failed",
        outcome.briefings.len(),
        outcome.warnings.len()
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Report, ReportCategory};
    use crate::{BriefError, Result};
    use std::cell::RefCell;

    /// Answers from canned data; codes starting with "Z" fail with HTTP 500
    struct StubSource {
        calls: RefCell<Vec<String>>,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ReportSource for StubSource {
        fn fetch(&self, code: &AirportCode) -> Result<OrganizedReports> {
            self.calls.borrow_mut().push(code.to_string());
            if code.as_str().starts_with('Z') {
                return Err(BriefError::status("CFPS returned 500", 500));
            }
            Ok(OrganizedReports::organize(vec![
                Report::new("metar", format!("METAR {code} 011200Z")),
                Report::new("notam", format!(r#"{{"raw":"{code} RWY CLSD"}}"#)),
            ]))
        }
    }

    fn codes(raw: &[&str]) -> Vec<AirportCode> {
        raw.iter().map(|c| AirportCode::new(c).unwrap()).collect()
    }

    #[test]
    fn test_failed_code_is_skipped_with_warning() {
        let source = StubSource::new();
        let outcome = process_batch(&source, &codes(&["CYYC", "ZZZZ"]));

        let rows = outcome.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].icao.as_str(), "CYYC");
        assert_eq!(rows[0].metar, "METAR CYYC 011200Z");
        assert_eq!(rows[0].notams, "CYYC RWY CLSD");
        assert_eq!(rows[0].taf, "");

        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].code.as_str(), "ZZZZ");
        assert!(outcome.warnings[0].message.contains("500"));
    }

    #[test]
    fn test_failure_does_not_stop_later_codes() {
        let source = StubSource::new();
        let outcome = process_batch(&source, &codes(&["ZAAA", "CYEG", "ZBBB", "CYVR"]));

        assert_eq!(
            *source.calls.borrow(),
            vec!["ZAAA", "CYEG", "ZBBB", "CYVR"]
        );
        let icaos: Vec<String> = outcome.rows().iter().map(|r| r.icao.to_string()).collect();
        assert_eq!(icaos, vec!["CYEG", "CYVR"]);
        assert_eq!(outcome.warnings.len(), 2);
    }

    #[test]
    fn test_duplicates_are_fetched_each_time() {
        let source = StubSource::new();
        let outcome = process_batch(&source, &codes(&["CYYC", "CYYC"]));
        assert_eq!(outcome.briefings.len(), 2);
        assert_eq!(source.calls.borrow().len(), 2);
    }

    #[test]
    fn test_empty_batch() {
        let outcome = process_batch(&StubSource::new(), &[]);
        assert!(outcome.briefings.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_briefing_keeps_organized_reports() {
        let outcome = process_batch(&StubSource::new(), &codes(&["CYQF"]));
        let briefing = &outcome.briefings[0];
        assert_eq!(briefing.reports.get(ReportCategory::Metar).len(), 1);
        assert_eq!(briefing.reports.get(ReportCategory::Notam).len(), 1);
    }
}
