use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cfps_brief::config::LoggingConfig;
use cfps_brief::output::{self, DetailView};
use cfps_brief::{BriefConfig, CfpsClient, ExportFormat, NotamOptions, input, process_batch};

#[derive(Parser, Debug)]
#[command(name = "cfps-brief", version)]
#[command(about = "Airport weather and NOTAM briefings from NAV CANADA CFPS")]
struct Args {
    /// ICAO code(s) separated by commas (e.g. CYYC,KTEB)
    #[arg(short, long)]
    icao: Option<String>,

    /// CSV or Excel sheet with an "ICAO" column (route sheets may use "From (ICAO)" and "To (ICAO)")
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// How to print the results
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Write cfps_weather_notams.xlsx (or .csv) into DIR (defaults to export.directory)
    #[arg(long, value_name = "DIR", num_args = 0..=1)]
    export: Option<Option<PathBuf>>,

    /// Spreadsheet format of the export (defaults to export.format)
    #[arg(long, value_enum)]
    export_format: Option<ExportFormat>,

    /// Only show NOTAMs containing one of these comma-separated terms (details output)
    #[arg(long, value_delimiter = ',')]
    filter: Vec<String>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Summary table: ICAO, METAR, TAF, NOTAMs
    Table,
    /// Summary rows as JSON
    Json,
    /// Per-airport briefing with laid-out TAFs and analysed NOTAMs
    Details,
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = BriefConfig::load_from_path(args.config.clone())
        .with_context(|| "Failed to load configuration")?;
    init_logging(&config.logging, args.verbose);
    debug!("Using configuration: {:?}", config);

    let direct = args
        .icao
        .as_deref()
        .map(input::parse_direct_input)
        .unwrap_or_default();

    let uploaded = match &args.file {
        Some(path) => match input::read_upload_file(path) {
            Ok(codes) => codes,
            Err(e) => {
                warn!("Ignoring upload {}: {}", path.display(), e);
                eprintln!("{}", e.user_message());
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let codes = input::merge_codes(direct, uploaded);
    if codes.is_empty() {
        println!("Enter at least one ICAO code with --icao or upload a CSV with --file.");
        return Ok(());
    }

    let client = CfpsClient::new(&config.api)?;
    let outcome = process_batch(&client, &codes);

    for warning in &outcome.warnings {
        eprintln!("Warning: failed to fetch data for {}: {}", warning.code, warning.message);
    }

    let rows = outcome.rows();
    match args.output {
        OutputFormat::Table => println!("{}", output::render_table(&rows)),
        OutputFormat::Json => println!("{}", output::render_json(&rows)?),
        OutputFormat::Details => {
            let options = NotamOptions {
                hide_keywords: config.notam.hide_keywords.clone(),
                filter_terms: args.filter.clone(),
            };
            for briefing in &outcome.briefings {
                println!("{}", DetailView::new(briefing, &options));
            }
        }
    }

    if let Some(directory) = args.export {
        let directory = directory.unwrap_or_else(|| PathBuf::from(&config.export.directory));
        let format = args.export_format.unwrap_or(config.export.format);
        match output::export(&rows, &directory, format) {
            Ok(path) => {
                info!("Export ready ({})", format.mime_type());
                eprintln!("Exported {} row(s) to {}", rows.len(), path.display());
            }
            Err(e) => {
                warn!("Export to {} failed: {}", directory.display(), e);
                eprintln!("{}", e.user_message());
            }
        }
    }

    Ok(())
}
