//! Decoding of METAR and TAF weather groups
//!
//! CFPS delivers METARs and TAFs as coded text only. The groups shared by
//! both (wind, visibility, present weather, cloud layers) are read into
//! [`Conditions`]; [`MetarSummary`] adds the observation-only groups and the
//! flight category derived from ceiling and visibility.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static STATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9]{3}$").expect("valid station regex"));
static ISSUE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})(\d{2})(\d{2})Z$").expect("valid issue time regex"));
static WIND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{3}|VRB)(\d{2,3})(?:G(\d{2,3}))?(KT|MPS)$").expect("valid wind regex")
});
static WIND_VARIATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}V\d{3}$").expect("valid wind variation regex"));
static VISIBILITY_MILES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([PM])?(\d{1,2}|\d/\d{1,2})SM$").expect("valid visibility regex")
});
static VISIBILITY_METRES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}$").expect("valid metric visibility regex"));
static CLOUD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(FEW|SCT|BKN|OVC|VV)(\d{3}|///)(CB|TCU)?$").expect("valid cloud regex")
});
static PRESENT_WEATHER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\+|-|VC)?(?:MI|PR|BC|DR|BL|SH|TS|FZ)?(?:DZ|RA|SN|SG|IC|PL|GR|GS|UP|BR|FG|FU|VA|DU|SA|HZ|PY|PO|SQ|FC|SS|DS)*$",
    )
    .expect("valid weather regex")
});
static TEMPERATURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(M?\d{2})/(M?\d{2})?$").expect("valid temperature regex"));
static ALTIMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([AQ])(\d{4})$").expect("valid altimeter regex"));

const SKY_CLEAR: [&str; 4] = ["SKC", "CLR", "NSC", "NCD"];
const METRES_PER_MILE: f64 = 1609.344;

/// True for a four-character location indicator such as `CYYC`
pub(crate) fn is_station(token: &str) -> bool {
    STATION.is_match(token)
}

/// `011140Z` as `day 01 11:40Z`
pub(crate) fn issue_time(token: &str) -> Option<String> {
    let captures = ISSUE_TIME.captures(token)?;
    Some(format!(
        "day {} {}:{}Z",
        &captures[1], &captures[2], &captures[3]
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Wind {
    /// True direction in degrees, `None` when variable
    pub direction: Option<u16>,
    pub speed: u16,
    pub gust: Option<u16>,
    pub unit: &'static str,
}

impl Wind {
    fn parse(token: &str) -> Option<Self> {
        let captures = WIND.captures(token)?;
        Some(Self {
            direction: captures[1].parse().ok(),
            speed: captures[2].parse().ok()?,
            gust: captures.get(3).and_then(|gust| gust.as_str().parse().ok()),
            unit: if &captures[4] == "MPS" { "m/s" } else { "kt" },
        })
    }

    #[must_use]
    pub fn is_calm(&self) -> bool {
        self.speed == 0 && self.gust.is_none()
    }
}

impl fmt::Display for Wind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_calm() {
            return f.write_str("calm");
        }
        match self.direction {
            Some(direction) => write!(f, "{direction:03}° at {} {}", self.speed, self.unit)?,
            None => write!(f, "variable at {} {}", self.speed, self.unit)?,
        }
        if let Some(gust) = self.gust {
            write!(f, " (gusting {gust} {})", self.unit)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Visibility {
    /// Statute miles as coded (`6+`, `1 1/2`, `<1/4`) and its value
    Miles { text: String, miles: f64 },
    Metres(u32),
    Cavok,
}

impl Visibility {
    fn parse_miles(whole: Option<&str>, token: &str) -> Option<Self> {
        let captures = VISIBILITY_MILES.captures(token)?;
        let amount = &captures[2];
        let mut miles = match amount.split_once('/') {
            Some((numerator, denominator)) => {
                let numerator: f64 = numerator.parse().ok()?;
                let denominator: f64 = denominator.parse().ok()?;
                if denominator == 0.0 {
                    return None;
                }
                numerator / denominator
            }
            None => amount.parse().ok()?,
        };
        let mut text = amount.to_string();
        if let Some(whole) = whole {
            miles += whole.parse::<f64>().ok()?;
            text = format!("{whole} {amount}");
        }
        match captures.get(1).map(|m| m.as_str()) {
            Some("P") => text.push('+'),
            Some("M") => text.insert(0, '<'),
            _ => {}
        }
        Some(Visibility::Miles { text, miles })
    }

    /// Visibility converted to statute miles
    #[must_use]
    pub fn statute_miles(&self) -> f64 {
        match self {
            Visibility::Miles { miles, .. } => *miles,
            Visibility::Metres(metres) => f64::from(*metres) / METRES_PER_MILE,
            Visibility::Cavok => 10.0,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Miles { text, .. } => write!(f, "{text} sm"),
            Visibility::Metres(9999) => f.write_str("10 km or more"),
            Visibility::Metres(metres) => write!(f, "{metres} m"),
            Visibility::Cavok => f.write_str("CAVOK"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudLayer {
    /// FEW, SCT, BKN, OVC or VV (vertical visibility)
    pub cover: String,
    /// Base in feet above ground, `None` when not reported (`///`)
    pub base_ft: Option<u32>,
    /// CB or TCU
    pub convective: Option<String>,
}

impl CloudLayer {
    fn parse(token: &str) -> Option<Self> {
        let captures = CLOUD.captures(token)?;
        Some(Self {
            cover: captures[1].to_string(),
            base_ft: captures[2].parse::<u32>().ok().map(|hundreds| hundreds * 100),
            convective: captures.get(3).map(|kind| kind.as_str().to_string()),
        })
    }

    /// Broken, overcast and obscured layers form a ceiling
    #[must_use]
    pub fn is_ceiling(&self) -> bool {
        matches!(self.cover.as_str(), "BKN" | "OVC" | "VV")
    }
}

impl fmt::Display for CloudLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base_ft {
            Some(base) => write!(f, "{} {base}ft", self.cover)?,
            None => write!(f, "{} ///", self.cover)?,
        }
        if let Some(kind) = &self.convective {
            write!(f, " {kind}")?;
        }
        Ok(())
    }
}

/// Flight rules category from ceiling and visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlightCategory {
    Vfr,
    Mvfr,
    Ifr,
    Lifr,
}

impl FlightCategory {
    #[must_use]
    pub fn from_limits(ceiling_ft: Option<u32>, visibility_sm: Option<f64>) -> Self {
        let below = |ceiling: u32, visibility: f64| {
            ceiling_ft.is_some_and(|c| c < ceiling) || visibility_sm.is_some_and(|v| v < visibility)
        };
        if below(500, 1.0) {
            FlightCategory::Lifr
        } else if below(1000, 3.0) {
            FlightCategory::Ifr
        } else if ceiling_ft.is_some_and(|c| c <= 3000) || visibility_sm.is_some_and(|v| v <= 5.0)
        {
            FlightCategory::Mvfr
        } else {
            FlightCategory::Vfr
        }
    }
}

impl fmt::Display for FlightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlightCategory::Vfr => "VFR",
            FlightCategory::Mvfr => "MVFR",
            FlightCategory::Ifr => "IFR",
            FlightCategory::Lifr => "LIFR",
        })
    }
}

/// Wind, visibility, weather and sky condition of an observation or forecast period
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Conditions {
    pub wind: Option<Wind>,
    pub visibility: Option<Visibility>,
    pub weather: Vec<String>,
    pub clouds: Vec<CloudLayer>,
    pub sky_clear: bool,
}

impl Conditions {
    /// Read the group at the start of `tokens`.
    ///
    /// Returns how many tokens were consumed, 0 when the first token is not
    /// one of these groups. Mixed-number visibility (`1 1/2SM`) takes two.
    pub fn read_group(&mut self, tokens: &[&str]) -> usize {
        let Some(&token) = tokens.first() else {
            return 0;
        };

        if let Some(wind) = Wind::parse(token) {
            self.wind = Some(wind);
            return 1;
        }
        if WIND_VARIATION.is_match(token) {
            return 1;
        }
        if token == "CAVOK" {
            self.visibility = Some(Visibility::Cavok);
            self.sky_clear = true;
            return 1;
        }
        if token.len() == 1 && token.chars().all(|c| c.is_ascii_digit()) {
            if let Some(visibility) = tokens
                .get(1)
                .and_then(|fraction| Visibility::parse_miles(Some(token), fraction))
            {
                self.visibility = Some(visibility);
                return 2;
            }
        }
        if let Some(visibility) = Visibility::parse_miles(None, token) {
            self.visibility = Some(visibility);
            return 1;
        }
        if VISIBILITY_METRES.is_match(token) {
            self.visibility = token.parse().ok().map(Visibility::Metres);
            return 1;
        }
        if let Some(layer) = CloudLayer::parse(token) {
            self.clouds.push(layer);
            return 1;
        }
        if SKY_CLEAR.contains(&token) {
            self.sky_clear = true;
            return 1;
        }
        if token.len() >= 2 && token != "VC" && PRESENT_WEATHER.is_match(token) {
            self.weather.push(token.to_string());
            return 1;
        }
        0
    }

    /// Base of the lowest broken, overcast or obscured layer
    #[must_use]
    pub fn ceiling(&self) -> Option<u32> {
        self.clouds
            .iter()
            .filter(|layer| layer.is_ceiling())
            .filter_map(|layer| layer.base_ft)
            .min()
    }

    /// `None` when neither visibility nor sky condition was reported
    #[must_use]
    pub fn flight_category(&self) -> Option<FlightCategory> {
        let visibility = self.visibility.as_ref().map(Visibility::statute_miles);
        let ceiling = self.ceiling();
        if visibility.is_none() && ceiling.is_none() && self.clouds.is_empty() && !self.sky_clear
        {
            return None;
        }
        Some(FlightCategory::from_limits(ceiling, visibility))
    }

    /// Cloud layers joined for display, `clear` for SKC/CLR
    #[must_use]
    pub fn clouds_text(&self) -> String {
        if self.clouds.is_empty() {
            return if self.sky_clear {
                "clear".to_string()
            } else {
                String::new()
            };
        }
        self.clouds
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Altimeter {
    InchesHg(f64),
    Hectopascals(u16),
}

impl Altimeter {
    fn parse(token: &str) -> Option<Self> {
        let captures = ALTIMETER.captures(token)?;
        let value: u16 = captures[2].parse().ok()?;
        Some(if &captures[1] == "A" {
            Altimeter::InchesHg(f64::from(value) / 100.0)
        } else {
            Altimeter::Hectopascals(value)
        })
    }
}

impl fmt::Display for Altimeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Altimeter::InchesHg(inches) => write!(f, "{inches:.2} inHg"),
            Altimeter::Hectopascals(hpa) => write!(f, "{hpa} hPa"),
        }
    }
}

fn parse_celsius(token: &str) -> Option<i32> {
    match token.strip_prefix('M') {
        Some(below_zero) => below_zero.parse::<i32>().ok().map(|value| -value),
        None => token.parse().ok(),
    }
}

/// Decoded content of one METAR or SPECI
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetarSummary {
    pub station: Option<String>,
    pub observed: Option<String>,
    pub conditions: Conditions,
    pub temperature: Option<i32>,
    pub dewpoint: Option<i32>,
    pub altimeter: Option<Altimeter>,
}

impl MetarSummary {
    /// Decode the body of a METAR. Remarks and trend groups are not read.
    #[must_use]
    pub fn decode(raw: &str) -> Self {
        let tokens: Vec<&str> = raw
            .split_whitespace()
            .take_while(|token| !matches!(*token, "RMK" | "TEMPO" | "BECMG" | "NOSIG"))
            .collect();

        let mut summary = Self::default();
        let mut index = tokens
            .iter()
            .take_while(|token| matches!(**token, "METAR" | "SPECI" | "COR"))
            .count();
        if let Some(&token) = tokens.get(index) {
            if is_station(token) {
                summary.station = Some(token.to_string());
                index += 1;
            }
        }

        while index < tokens.len() {
            let consumed = summary.conditions.read_group(&tokens[index..]);
            if consumed > 0 {
                index += consumed;
                continue;
            }

            let token = tokens[index];
            if let Some(time) = issue_time(token) {
                summary.observed.get_or_insert(time);
            } else if let Some(captures) = TEMPERATURE.captures(token) {
                summary.temperature = parse_celsius(&captures[1]);
                summary.dewpoint = captures.get(2).and_then(|dew| parse_celsius(dew.as_str()));
            } else if let Some(altimeter) = Altimeter::parse(token) {
                summary.altimeter = Some(altimeter);
            }
            index += 1;
        }

        summary
    }

    #[must_use]
    pub fn flight_category(&self) -> Option<FlightCategory> {
        self.conditions.flight_category()
    }

    /// One line per reported element, in briefing order
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        let conditions = &self.conditions;
        let mut lines = Vec::new();

        if let Some(observed) = &self.observed {
            lines.push(format!("Observed {observed}"));
        }
        if let Some(wind) = &conditions.wind {
            lines.push(format!("Wind {wind}"));
        }
        if let Some(visibility) = &conditions.visibility {
            lines.push(format!("Visibility {visibility}"));
        }
        if !conditions.weather.is_empty() {
            lines.push(format!("Weather {}", conditions.weather.join(" ")));
        }
        let clouds = conditions.clouds_text();
        if !clouds.is_empty() {
            lines.push(format!("Clouds {clouds}"));
        }
        if let Some(ceiling) = conditions.ceiling() {
            lines.push(format!("Ceiling {ceiling} ft"));
        }
        match (self.temperature, self.dewpoint) {
            (Some(temp), Some(dew)) => lines.push(format!("Temp {temp}°C / Dew point {dew}°C")),
            (Some(temp), None) => lines.push(format!("Temp {temp}°C")),
            _ => {}
        }
        if let Some(altimeter) = &self.altimeter {
            lines.push(format!("Altimeter {altimeter}"));
        }

        lines
    }
}
