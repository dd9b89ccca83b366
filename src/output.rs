//! Rendering and export of briefing results

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use comfy_table::{ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::briefing::AirportBriefing;
use crate::models::{ReportCategory, ResultRow};
use crate::notam::{self, NotamOptions};
use crate::taf::{self, TafSummary};
use crate::weather::MetarSummary;
use crate::{BriefError, Result};

/// Longest text an Excel cell holds
const MAX_CELL_CHARS: usize = 32_767;

/// File format of the spreadsheet export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// Fixed name of the export file
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "cfps_weather_notams.xlsx",
            ExportFormat::Csv => "cfps_weather_notams.csv",
        }
    }

    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv",
        }
    }
}

/// Summary table with one row per airport
#[must_use]
pub fn render_table(rows: &[ResultRow]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(ResultRow::HEADERS);

    for row in rows {
        table.add_row(row.cells());
    }

    table.to_string()
}

/// Rows as a pretty-printed JSON array
pub fn render_json(rows: &[ResultRow]) -> Result<String> {
    serde_json::to_string_pretty(rows)
        .map_err(|e| BriefError::export(format!("Failed to serialize rows: {e}")))
}

/// Write the rows into `directory` under the fixed name of `format`, replacing any previous export
pub fn export(rows: &[ResultRow], directory: &Path, format: ExportFormat) -> Result<PathBuf> {
    let path = directory.join(format.file_name());
    match format {
        ExportFormat::Xlsx => write_xlsx(rows, &path)?,
        ExportFormat::Csv => write_csv(rows, &path)?,
    }
    info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(path)
}

fn write_csv(rows: &[ResultRow], path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(ResultRow::HEADERS)?;
    for row in rows {
        writer.write_record(row.cells())?;
    }
    writer.flush()?;
    Ok(())
}

fn write_xlsx(rows: &[ResultRow], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let wrapped = Format::new().set_text_wrap();

    let sheet = workbook.add_worksheet();
    for (column, title) in (0u16..).zip(ResultRow::HEADERS) {
        sheet.write_string_with_format(0, column, title, &header)?;
    }
    for (line, row) in (1u32..).zip(rows) {
        for (column, cell) in (0u16..).zip(row.cells()) {
            sheet.write_string_with_format(line, column, fit_cell(cell), &wrapped)?;
        }
    }
    sheet.set_column_width(0, 8)?;
    for column in 1..4u16 {
        sheet.set_column_width(column, 60)?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Cut text to the Excel cell limit on a character boundary
fn fit_cell(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((index, _)) => {
            debug!("Truncating a {} byte cell for the spreadsheet", text.len());
            &text[..index]
        }
        None => text,
    }
}

/// Full briefing of one airport: decoded METAR, TAF periods and the analysed NOTAM list
pub struct DetailView<'a> {
    pub briefing: &'a AirportBriefing,
    pub options: &'a NotamOptions,
    /// Reference time for the remaining validity of NOTAMs (UTC)
    pub now: NaiveDateTime,
}

impl<'a> DetailView<'a> {
    #[must_use]
    pub fn new(briefing: &'a AirportBriefing, options: &'a NotamOptions) -> Self {
        Self {
            briefing,
            options,
            now: chrono::Utc::now().naive_utc(),
        }
    }

    /// Use a fixed reference time instead of the current one
    #[must_use]
    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    fn write_metars(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "METAR")?;
        let metars = self.briefing.reports.texts(ReportCategory::Metar);
        if metars.is_empty() {
            writeln!(f, "  No METAR data returned for this station.")?;
        }
        for raw in &metars {
            writeln!(f, "  {raw}")?;
            let summary = MetarSummary::decode(raw);
            if let Some(category) = summary.flight_category() {
                writeln!(f, "    Flight category: {category}")?;
            }
            for line in summary.summary_lines() {
                writeln!(f, "    {line}")?;
            }
        }
        Ok(())
    }

    fn write_tafs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TAF")?;
        let tafs = self.briefing.reports.texts(ReportCategory::Taf);
        if tafs.is_empty() {
            writeln!(f, "  No TAF data returned for this station.")?;
        }
        for raw in &tafs {
            for line in taf::format_for_display(raw).lines() {
                writeln!(f, "  {line}")?;
            }

            let summary = TafSummary::decode(raw);
            match (&summary.issued, &summary.valid) {
                (Some(issued), Some(valid)) => writeln!(f, "  Issued {issued}, valid {valid}")?,
                (Some(issued), None) => writeln!(f, "  Issued {issued}")?,
                (None, Some(valid)) => writeln!(f, "  Valid {valid}")?,
                (None, None) => {}
            }

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(["Period", "Wind", "Visibility", "Weather", "Clouds"]);
            for period in &summary.periods {
                let conditions = &period.conditions;
                table.add_row([
                    period.change.clone(),
                    conditions.wind.map(|wind| wind.to_string()).unwrap_or_default(),
                    conditions
                        .visibility
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                    conditions.weather.join(" "),
                    conditions.clouds_text(),
                ]);
            }
            for line in table.to_string().lines() {
                writeln!(f, "  {line}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for DetailView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = &self.briefing.code;
        let notams = notam::prepare_for_display(&self.briefing.reports, self.options);
        let filtering = !self.options.filter_terms.is_empty();

        if filtering && notams.is_empty() {
            return writeln!(f, "=== {code} === no NOTAMs match the filter");
        }

        writeln!(f, "=== {code} ===")?;
        self.write_metars(f)?;
        self.write_tafs(f)?;

        writeln!(f, "NOTAMs ({})", notams.len())?;
        if notams.is_empty() {
            if code.is_canadian() {
                writeln!(f, "  No NOTAMs to show.")?;
            } else {
                writeln!(
                    f,
                    "  No NOTAMs to show. CFPS only carries NOTAMs for Canadian aerodromes."
                )?;
            }
        }
        for entry in &notams {
            writeln!(f, "  [{}]", entry.category)?;
            let text = notam::highlight(&entry.text, &self.options.filter_terms);
            for line in text.lines() {
                writeln!(f, "    {line}")?;
            }
            write!(f, "    Effective: {}  Expires: {}", entry.start, entry.end)?;
            if let Some(remaining) = entry.remaining(self.now) {
                write!(f, " {remaining}")?;
            }
            if let Some(duration) = entry.duration() {
                write!(f, "  Duration: {}", notam::format_duration(duration))?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
