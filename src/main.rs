//! Cervicare: cervical cancer risk scoring.
//!
//! Reads one `ClinicalInput` as JSON from a file or stdin, prints the
//! `RiskAssessment` as JSON on stdout.
//!
//! ```bash
//! cervicare screening.json
//! cat screening.json | cervicare --patient KE-0042
//! cervicare --summary
//! ```

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cervicare::adapters::sanitize::SanitizingMakeWriter;
use cervicare::adapters::sqlite::SqliteStorage;
use cervicare::config::{AppConfig, LogTarget};
use cervicare::{ClinicalInput, RiskPredictor, ScreeningService};

const USAGE: &str = "Usage: cervicare [--patient <id>] [input.json]\n       cervicare --summary";

#[derive(Debug, Default)]
struct Args {
    input: Option<PathBuf>,
    patient: Option<String>,
    summary: bool,
}

fn parse_args() -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--patient" => {
                parsed.patient = Some(args.next().context(USAGE)?);
            }
            "--summary" => parsed.summary = true,
            "-h" | "--help" => bail!(USAGE),
            _ if parsed.input.is_none() => parsed.input = Some(PathBuf::from(arg)),
            _ => bail!(USAGE),
        }
    }
    Ok(parsed)
}

fn read_input(path: Option<&PathBuf>) -> Result<ClinicalInput> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("Input is not a valid screening record")
}

fn open_storage(config: &AppConfig) -> Result<SqliteStorage> {
    let storage = match &config.db_path {
        Some(path) => SqliteStorage::new(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?,
        None => {
            tracing::warn!("CERVICARE_DB_PATH not set, screenings will not outlive this process");
            SqliteStorage::in_memory()?
        }
    };
    Ok(storage)
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let config = AppConfig::from_env();

    // Stdout carries the JSON result; logs go to stderr or a file.
    let (writer, _guard) = match &config.log_target {
        LogTarget::File(log_file) => {
            if let Some(parent) = log_file.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
            tracing_appender::non_blocking(file)
        }
        LogTarget::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();
    cervicare::adapters::sanitize::route_panics_through_tracing();

    let predictor = Arc::new(RiskPredictor::new(&config.predictor));

    if args.summary {
        let service = ScreeningService::new(predictor, Arc::new(open_storage(&config)?));
        let summary = service.summary()?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let input = read_input(args.input.as_ref())?;

    let assessment = match args.patient {
        Some(patient_id) => {
            let service = ScreeningService::new(predictor, Arc::new(open_storage(&config)?));
            let outcome = service.submit(&patient_id, input)?;
            if let Some(follow_up) = &outcome.follow_up {
                tracing::info!("Follow-up scheduled for {}", follow_up.due_date);
            }
            outcome.record.assessment
        }
        None => {
            if let Err(errors) = input.validate() {
                bail!("Invalid screening input: {}", errors.join("; "));
            }
            predictor.predict(&input)
        }
    };

    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}
