//! CFPS alpha API client
//!
//! This module provides the HTTP client that retrieves weather and NOTAM
//! records for one airport from the NAV CANADA CFPS "alpha" endpoint and
//! organizes them by report type. Requests are blocking and sequential; there
//! is no retry, rate limiting or caching.

use crate::config::ApiConfig;
use crate::models::{AirportCode, OrganizedReports, Report, ReportCategory};
use crate::{BriefError, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Value of the `notam_choice` query parameter
pub const NOTAM_CHOICE: &str = "default";

/// Anything that can produce the organized reports of one airport
pub trait ReportSource {
    fn fetch(&self, code: &AirportCode) -> Result<OrganizedReports>;
}

/// Body of an alpha API response
#[derive(Debug, Deserialize)]
struct AlphaResponse {
    data: Vec<Report>,
}

/// Query parameters of one alpha request.
///
/// Every category is its own `alpha` pair; the API ignores a comma-joined
/// list and would only answer for the first category.
#[must_use]
pub fn build_query(
    site: &AirportCode,
    categories: &[ReportCategory],
    cache_buster: &str,
) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(categories.len() + 3);
    params.push(("site", site.to_string()));
    params.extend(
        categories
            .iter()
            .map(|category| ("alpha", category.as_str().to_string())),
    );
    params.push(("notam_choice", NOTAM_CHOICE.to_string()));
    params.push(("_", cache_buster.to_string()));
    params
}

/// Parse an alpha response body and bucket its records by type
pub fn parse_response(body: &str) -> Result<OrganizedReports> {
    let response: AlphaResponse = serde_json::from_str(body)
        .map_err(|e| BriefError::parse(format!("Invalid CFPS response: {e}")))?;
    Ok(OrganizedReports::organize(response.data))
}

/// Blocking client for the CFPS alpha endpoint
pub struct CfpsClient {
    /// HTTP client
    client: Client,
    /// API configuration
    config: ApiConfig,
    /// Categories requested for every airport
    categories: Vec<ReportCategory>,
}

impl CfpsClient {
    /// Create a new client
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.into());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| BriefError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
            categories: ReportCategory::ALL.to_vec(),
        })
    }

    /// Fetch the raw response body for one airport
    fn request(&self, code: &AirportCode) -> Result<String> {
        let params = build_query(code, &self.categories, &self.config.cache_buster_token());
        debug!("CFPS request: {} {:?}", self.config.base_url, params);

        let start_time = Instant::now();
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&params)
            .send()
            .map_err(|e| {
                warn!("Network error for {}: {}", code, e);
                BriefError::network(format!("Request for {code} failed: {e}"))
            })?;

        let status = response.status();
        debug!(
            "HTTP response received: {} in {:.3}s",
            status,
            start_time.elapsed().as_secs_f64()
        );

        if !status.is_success() {
            error!("CFPS request for {} failed with {}", code, status);
            return Err(BriefError::status(
                format!(
                    "CFPS returned {} - {} for {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown error"),
                    code
                ),
                status.as_u16(),
            ));
        }

        let body = response
            .text()
            .map_err(|e| BriefError::network(format!("Failed to read response for {code}: {e}")))?;

        let total_duration = start_time.elapsed();
        if total_duration.as_secs() > 5 {
            warn!(
                "Slow CFPS response for {}: {:.3}s",
                code,
                total_duration.as_secs_f64()
            );
        }

        Ok(body)
    }
}

impl ReportSource for CfpsClient {
    #[instrument(skip(self), fields(site = %code))]
    fn fetch(&self, code: &AirportCode) -> Result<OrganizedReports> {
        let body = self.request(code)?;
        let reports = parse_response(&body).inspect_err(|e| {
            error!("Failed to parse CFPS response for {}: {}", code, e);
        })?;

        info!(
            "Retrieved {} records for {} ({})",
            reports.len(),
            code,
            reports.kinds().collect::<Vec<_>>().join(", ")
        );
        Ok(reports)
    }
}
