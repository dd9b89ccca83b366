//! TAF layout and decoding for terminal display

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::weather::{self, Conditions};

static CHANGE_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(FM\d{6}|TEMPO|BECMG|PROB\d{2}|RMK|AMD|COR)$").expect("valid TAF change regex")
});
static PROBABILITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PROB\d{2}$").expect("valid PROB regex"));
static FROM_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^FM(\d{2})(\d{2})(\d{2})$").expect("valid FM regex"));
static VALID_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2})(\d{2})/(\d{2})(\d{2})$").expect("valid period regex")
});

/// Put every change group of a TAF on its own line.
///
/// `PROB30 TEMPO` is one group, so a `TEMPO` right after a line opened by
/// `PROBnn` stays on that line.
#[must_use]
pub fn format_for_display(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for token in raw.split_whitespace() {
        let starts_group = match current.first() {
            Some(first) => {
                CHANGE_GROUP.is_match(token) && !(PROBABILITY.is_match(first) && token == "TEMPO")
            }
            None => false,
        };
        if starts_group {
            lines.push(current.join(" "));
            current.clear();
        }
        current.push(token);
    }

    if !current.is_empty() {
        lines.push(current.join(" "));
    }
    lines.join("\n")
}

/// `0112/0212` as `01 12Z to 02 12Z`
fn valid_period(token: &str) -> Option<String> {
    let captures = VALID_PERIOD.captures(token)?;
    Some(format!(
        "{} {}Z to {} {}Z",
        &captures[1], &captures[2], &captures[3], &captures[4]
    ))
}

/// Label and token count of a change group starting at `tokens[0]`
fn change_group(tokens: &[&str]) -> Option<(String, usize)> {
    let first = *tokens.first()?;

    if let Some(captures) = FROM_TIME.captures(first) {
        let label = format!("From {} {}:{}Z", &captures[1], &captures[2], &captures[3]);
        return Some((label, 1));
    }

    let mut words = Vec::new();
    let mut consumed = 0;
    if PROBABILITY.is_match(first) {
        words.push(first.to_string());
        consumed += 1;
    }
    if let Some(&kind) = tokens.get(consumed) {
        if kind == "TEMPO" || kind == "BECMG" {
            words.push(kind.to_string());
            consumed += 1;
        }
    }
    if consumed == 0 {
        return None;
    }
    if let Some(period) = tokens.get(consumed).and_then(|token| valid_period(token)) {
        words.push(period);
        consumed += 1;
    }
    Some((words.join(" "), consumed))
}

/// One forecast period: the base forecast or a change group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPeriod {
    /// `Initial`, `From 01 18:00Z`, `TEMPO 01 20Z to 01 24Z`, ...
    pub change: String,
    pub conditions: Conditions,
}

impl ForecastPeriod {
    fn new(change: String) -> Self {
        Self {
            change,
            conditions: Conditions::default(),
        }
    }
}

/// Decoded header and forecast periods of one TAF
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TafSummary {
    pub station: Option<String>,
    pub issued: Option<String>,
    pub valid: Option<String>,
    pub periods: Vec<ForecastPeriod>,
}

impl TafSummary {
    /// Decode a TAF up to its remarks
    #[must_use]
    pub fn decode(raw: &str) -> Self {
        let tokens: Vec<&str> = raw
            .split_whitespace()
            .take_while(|token| *token != "RMK")
            .collect();

        let mut summary = Self::default();
        let mut index = tokens
            .iter()
            .take_while(|token| matches!(**token, "TAF" | "AMD" | "COR"))
            .count();
        if let Some(&token) = tokens.get(index) {
            if weather::is_station(token) {
                summary.station = Some(token.to_string());
                index += 1;
            }
        }

        let mut current = ForecastPeriod::new("Initial".to_string());
        while index < tokens.len() {
            if let Some((label, consumed)) = change_group(&tokens[index..]) {
                summary.periods.push(current);
                current = ForecastPeriod::new(label);
                index += consumed;
                continue;
            }

            let consumed = current.conditions.read_group(&tokens[index..]);
            if consumed > 0 {
                index += consumed;
                continue;
            }

            let token = tokens[index];
            if summary.issued.is_none() && summary.periods.is_empty() {
                summary.issued = weather::issue_time(token);
            }
            if summary.valid.is_none() && summary.periods.is_empty() {
                summary.valid = valid_period(token);
            }
            index += 1;
        }
        summary.periods.push(current);

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_change_groups() {
        let raw = "TAF CYYC 011140Z 0112/0212 27012KT P6SM SCT030 FM011800 30015G25KT P6SM BKN040 TEMPO 0120/0124 5SM -SHRA BECMG 0200/0202 VRB03KT RMK NXT FCST BY 011800Z";
        assert_eq!(
            format_for_display(raw),
            "TAF CYYC 011140Z 0112/0212 27012KT P6SM SCT030\n\
             FM011800 30015G25KT P6SM BKN040\n\
             TEMPO 0120/0124 5SM -SHRA\n\
             BECMG 0200/0202 VRB03KT\n\
             RMK NXT FCST BY 011800Z"
        );
    }

    #[test]
    fn test_prob_tempo_stays_together() {
        let raw = "TAF CYEG 011140Z 0112/0212 VRB03KT P6SM PROB30 TEMPO 0118/0122 3SM TSRA";
        assert_eq!(
            format_for_display(raw),
            "TAF CYEG 011140Z 0112/0212 VRB03KT P6SM\nPROB30 TEMPO 0118/0122 3SM TSRA"
        );
    }

    #[test]
    fn test_amended_taf_keeps_leading_group() {
        assert_eq!(format_for_display("AMD TAF CYVR"), "AMD TAF CYVR");
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(format_for_display(""), "");
        assert_eq!(format_for_display("   "), "");
    }

    #[test]
    fn test_decode_periods() {
        let taf = TafSummary::decode(
            "TAF CYYC 011140Z 0112/0212 27012KT P6SM SCT030 FM011800 30015G25KT P6SM BKN040 \
             PROB30 TEMPO 0120/0124 5SM -SHRA BECMG 0200/0202 VRB03KT RMK NXT FCST BY 011800Z",
        );
        assert_eq!(taf.station.as_deref(), Some("CYYC"));
        assert_eq!(taf.issued.as_deref(), Some("day 01 11:40Z"));
        assert_eq!(taf.valid.as_deref(), Some("01 12Z to 02 12Z"));

        let changes: Vec<&str> = taf.periods.iter().map(|p| p.change.as_str()).collect();
        assert_eq!(
            changes,
            vec![
                "Initial",
                "From 01 18:00Z",
                "PROB30 TEMPO 01 20Z to 01 24Z",
                "BECMG 02 00Z to 02 02Z",
            ]
        );

        let from = &taf.periods[1].conditions;
        assert_eq!(from.wind.map(|w| w.to_string()).as_deref(), Some("300° at 15 kt (gusting 25 kt)"));
        assert_eq!(from.ceiling(), Some(4000));
        assert_eq!(taf.periods[2].conditions.weather, vec!["-SHRA".to_string()]);
        assert!(taf.periods[3].conditions.visibility.is_none());
    }

    #[test]
    fn test_decode_amended_taf() {
        let taf = TafSummary::decode("TAF AMD CYVR 011530Z 0115/0218 VRB03KT 1/2SM FG VV002");
        assert_eq!(taf.station.as_deref(), Some("CYVR"));
        assert_eq!(taf.periods.len(), 1);
        assert_eq!(
            taf.periods[0].conditions.flight_category(),
            Some(crate::weather::FlightCategory::Lifr)
        );
    }

    #[test]
    fn test_decode_empty_taf() {
        let taf = TafSummary::decode("");
        assert_eq!(taf.station, None);
        assert_eq!(taf.periods.len(), 1);
        assert_eq!(taf.periods[0].conditions, Conditions::default());
    }
}
