//! Flattened per-airport summary row

use serde::{Deserialize, Serialize};

use super::{AirportCode, OrganizedReports, ReportCategory};

/// One line of the summary table and of the spreadsheet export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "ICAO")]
    pub icao: AirportCode,
    #[serde(rename = "METAR")]
    pub metar: String,
    #[serde(rename = "TAF")]
    pub taf: String,
    #[serde(rename = "NOTAMs")]
    pub notams: String,
}

impl ResultRow {
    /// Column headers, in column order
    pub const HEADERS: [&'static str; 4] = ["ICAO", "METAR", "TAF", "NOTAMs"];

    #[must_use]
    pub fn from_reports(icao: AirportCode, reports: &OrganizedReports) -> Self {
        Self {
            icao,
            metar: reports.extract_text(ReportCategory::Metar),
            taf: reports.extract_text(ReportCategory::Taf),
            notams: reports.extract_text(ReportCategory::Notam),
        }
    }

    /// Cell values, in column order
    #[must_use]
    pub fn cells(&self) -> [&str; 4] {
        [
            self.icao.as_str(),
            &self.metar,
            &self.taf,
            &self.notams,
        ]
    }
}
