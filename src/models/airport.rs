//! Airport identifier model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::BriefError;

/// Airport code as sent to the API: trimmed and upper-cased.
///
/// Nothing beyond emptiness is validated. An unknown code is still a valid
/// request; the API simply answers with no records or an error status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AirportCode(String);

impl AirportCode {
    /// Normalize a user-supplied code
    pub fn new(raw: &str) -> crate::Result<Self> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(BriefError::input("Airport code cannot be empty"));
        }
        Ok(Self(code.to_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canadian aerodromes (C***) are the ones CFPS publishes NOTAMs for
    #[must_use]
    pub fn is_canadian(&self) -> bool {
        self.0.starts_with('C')
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AirportCode {
    type Err = BriefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AirportCode {
    type Error = BriefError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(&raw)
    }
}

impl From<AirportCode> for String {
    fn from(code: AirportCode) -> Self {
        code.0
    }
}

impl AsRef<str> for AirportCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
