//! `cfps-brief` - airport weather and NOTAM briefings from NAV CANADA CFPS
//!
//! This library fetches the alpha weather feed for a list of airports,
//! organizes the records by report type, and extracts the METAR, TAF and
//! NOTAM text for tabular display and spreadsheet export. METARs and TAFs
//! are also decoded for the per-airport briefing.

pub mod api;
pub mod briefing;
pub mod config;
pub mod error;
pub mod input;
pub mod models;
pub mod notam;
pub mod output;
pub mod taf;
pub mod weather;

// Re-export core types for public API
pub use api::{CfpsClient, ReportSource, build_query};
pub use briefing::{AirportBriefing, BatchOutcome, FetchWarning, process_batch};
pub use config::BriefConfig;
pub use error::BriefError;
pub use models::{AirportCode, OrganizedReports, Report, ReportCategory, ResultRow};
pub use notam::{NotamEntry, NotamOptions};
pub use output::ExportFormat;
pub use weather::{Conditions, FlightCategory, MetarSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, BriefError>;
