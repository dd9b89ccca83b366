//! Raw API records and their organization by report category

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::notam;

/// Report categories requested from the alpha endpoint, in request order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    Sigmet,
    Airmet,
    Notam,
    Metar,
    Taf,
    Pirep,
    Upperwind,
    SpaceWeather,
}

impl ReportCategory {
    pub const ALL: [ReportCategory; 8] = [
        ReportCategory::Sigmet,
        ReportCategory::Airmet,
        ReportCategory::Notam,
        ReportCategory::Metar,
        ReportCategory::Taf,
        ReportCategory::Pirep,
        ReportCategory::Upperwind,
        ReportCategory::SpaceWeather,
    ];

    /// Name used both as the `alpha` query value and as the record `type`
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCategory::Sigmet => "sigmet",
            ReportCategory::Airmet => "airmet",
            ReportCategory::Notam => "notam",
            ReportCategory::Metar => "metar",
            ReportCategory::Taf => "taf",
            ReportCategory::Pirep => "pirep",
            ReportCategory::Upperwind => "upperwind",
            ReportCategory::SpaceWeather => "space_weather",
        }
    }

    /// NOTAMs are long multi-line texts and get a blank line between them
    #[must_use]
    pub fn separator(&self) -> &'static str {
        match self {
            ReportCategory::Notam => "\n\n",
            _ => "\n",
        }
    }
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record from the `data` list of the alpha API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Category this record belongs to, e.g. "metar"
    #[serde(rename = "type")]
    pub kind: String,
    /// Raw report text. For NOTAMs this is usually a JSON document itself.
    #[serde(default, deserialize_with = "text_or_json")]
    pub text: String,
    /// Every other field the API sent, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Report {
    pub fn new<K: Into<String>, T: Into<String>>(kind: K, text: T) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            extra: Map::new(),
        }
    }
}

// The API occasionally sends `text` as an embedded object or null instead of a string.
fn text_or_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Records of one airport bucketed by their `type`.
///
/// Only types present in the response get a bucket. Record order inside a
/// bucket is the response order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrganizedReports {
    buckets: BTreeMap<String, Vec<Report>>,
}

impl OrganizedReports {
    /// Bucket every record under its declared type
    pub fn organize<I>(reports: I) -> Self
    where
        I: IntoIterator<Item = Report>,
    {
        let mut buckets: BTreeMap<String, Vec<Report>> = BTreeMap::new();
        for report in reports {
            buckets.entry(report.kind.clone()).or_default().push(report);
        }
        Self { buckets }
    }

    /// Records of a category, empty when the API sent none
    #[must_use]
    pub fn bucket(&self, kind: &str) -> &[Report] {
        self.buckets.get(kind).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, category: ReportCategory) -> &[Report] {
        self.bucket(category.as_str())
    }

    /// Types present in the response
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Total number of records across all buckets
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display text of each record in a category.
    ///
    /// NOTAM texts are replaced by their decoded `raw` rendering when they
    /// carry one.
    #[must_use]
    pub fn texts(&self, category: ReportCategory) -> Vec<String> {
        self.get(category)
            .iter()
            .map(|report| match category {
                ReportCategory::Notam => notam::display_text(&report.text),
                _ => report.text.clone(),
            })
            .collect()
    }

    /// All display texts of a category joined into one block
    #[must_use]
    pub fn extract_text(&self, category: ReportCategory) -> String {
        self.texts(category).join(category.separator())
    }
}
