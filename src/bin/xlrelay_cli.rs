//! CLI tool for xlrelay - runs one request against a workbook store
//!
//! Usage:
//!   xlrelay_cli --request req.json --records rows.json   # plain records (autoMap)
//!   xlrelay_cli --request req.json --items items.json    # full input items
//!   xlrelay_cli --config settings.json --request req.json

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::de::DeserializeOwned;
use xlrelay::config::{Settings, TransportSettings};
use xlrelay::{InputItem, Record, Request, Router, XlrelayError};

#[derive(Parser, Debug)]
#[command(version, about = "Append, upsert and edit rows of XLSX workbooks in a file store.")]
struct Args {
    /// Request JSON: resource, operation, file, sheet and parameters.
    #[arg(long)]
    request: PathBuf,

    /// JSON array of input items (`{json, columns, rowData}`).
    #[arg(long, conflicts_with = "records")]
    items: Option<PathBuf>,

    /// JSON array of plain records, one input item each.
    #[arg(long)]
    records: Option<PathBuf>,

    /// Settings file selecting the transport.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root directory for the filesystem transport (overrides the settings).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, XlrelayError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn load_items(args: &Args) -> Result<Vec<InputItem>, XlrelayError> {
    if let Some(path) = &args.items {
        return read_json(path);
    }
    if let Some(path) = &args.records {
        let records: Vec<Record> = read_json(path)?;
        return Ok(records.into_iter().map(InputItem::from_record).collect());
    }
    Ok(Vec::new())
}

fn run(args: &Args) -> Result<serde_json::Value, XlrelayError> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(root) = &args.root {
        settings.transport = TransportSettings::Fs { root: root.clone() };
    }

    let request: Request = read_json(&args.request)?;
    let items = load_items(args)?;
    let router = Router::new(settings.build_transport()?);
    router.execute(&request, &items)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(&args) {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error serializing result: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
