//! Data models for the CFPS briefing tool
//!
//! This module contains the core domain models organized by concern:
//! - Airport: normalized airport identifiers
//! - Report: raw API records and their per-category organization
//! - Row: the flattened one-line-per-airport summary used for display and export

pub mod airport;
pub mod report;
pub mod row;

// Re-export all public types for convenient access
pub use airport::AirportCode;
pub use report::{OrganizedReports, Report, ReportCategory};
pub use row::ResultRow;
