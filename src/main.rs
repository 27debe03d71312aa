//! MarkGuard - IC marking authenticity checker
//!
//! Compares the text printed on an IC package against reference data for the claimed
//! part number and reports whether the part looks genuine.

mod app;
mod config;
mod reference;
mod storage;
mod validation;
mod vision;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::ScanService;
use crate::config::{AppConfig, StorageBackend};
use crate::reference::{load_catalog, ReferenceResolver, StaticReferenceTable};
use crate::storage::{HistoryPage, InMemoryStore, ScanStore, SqliteStore};
use crate::vision::{BlurDetector, MockOcr, OcrProvider, TranscriptOcr};

/// MarkGuard - IC marking authenticity checker
#[derive(Parser, Debug)]
#[command(name = "markguard")]
#[command(about = "Check IC package markings against reference part data")]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use a throwaway in-memory store for this run
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a package photo against a claimed part number
    Scan {
        /// Photo of the IC package
        #[arg(short, long)]
        image: PathBuf,

        /// Claimed part number
        #[arg(short, long)]
        part: String,

        /// Line of text read from the package (repeatable)
        #[arg(short, long = "text")]
        text: Vec<String>,

        /// Use the mock OCR provider
        #[arg(long)]
        mock: bool,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show reference data for a part number
    Lookup {
        part: String,
    },

    /// Show aggregate scan statistics
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// List past scans, newest first
    History {
        #[arg(long, default_value = "1")]
        page: usize,

        #[arg(long, default_value = "10")]
        limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => storage::get_config_dir()?.join("config.toml"),
    };
    let config = load_or_default_config(&config_path)?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.general.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Scan {
            image,
            part,
            text,
            mock,
            json,
        } => run_scan(&config, args.memory, &image, &part, text, mock, json),
        Command::Lookup { part } => run_lookup(&config, &part),
        Command::Stats { json } => {
            let store = open_store(&config, args.memory)?;
            let stats = store.statistics()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Total scanned: {}", stats.total);
                println!("Genuine:       {}", stats.genuine);
                println!("Counterfeit:   {}", stats.counterfeit);
                println!("Yield rate:    {:.2}%", stats.yield_rate);
            }
            Ok(())
        }
        Command::History { page, limit, json } => {
            let store = open_store(&config, args.memory)?;
            let history = store.history(page, limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                print_history(&history);
            }
            Ok(())
        }
        Command::InitConfig { force } => {
            if config_path.exists() && !force {
                anyhow::bail!("{:?} already exists (use --force to overwrite)", config_path);
            }
            config::save_config(&AppConfig::default(), &config_path)?;
            println!("Wrote default configuration to {:?}", config_path);
            Ok(())
        }
    }
}

/// Load configuration from file, or use defaults if it does not exist
fn load_or_default_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        return config::load_config(path);
    }
    Ok(AppConfig::default())
}

/// Build the reference table, merging the configured catalog if any
fn build_resolver(config: &AppConfig) -> Result<StaticReferenceTable> {
    let mut table = StaticReferenceTable::builtin();
    if let Some(path) = &config.reference.catalog_path {
        table.extend(load_catalog(path)?);
    }
    info!("Reference table ready with {} part numbers", table.len());
    Ok(table)
}

fn open_store(config: &AppConfig, force_memory: bool) -> Result<Arc<dyn ScanStore>> {
    if force_memory || config.storage.backend == StorageBackend::Memory {
        info!("Using in-memory scan store");
        return Ok(Arc::new(InMemoryStore::new()));
    }

    let path = match &config.storage.database_path {
        Some(path) => path.clone(),
        None => storage::get_data_dir()?.join("scans.db"),
    };
    let store = SqliteStore::open(&path)
        .with_context(|| format!("Failed to open scan database {:?}", path))?;
    Ok(Arc::new(store))
}

fn build_ocr(config: &AppConfig, text: Vec<String>, force_mock: bool) -> Box<dyn OcrProvider> {
    if force_mock || config.ocr.use_mock_ocr {
        info!("Using mock OCR provider");
        return Box::new(MockOcr::new(
            config.ocr.mock_fragments.clone(),
            config.ocr.mock_blurry,
        ));
    }
    Box::new(TranscriptOcr::new(
        text,
        BlurDetector::new(config.ocr.blur_threshold),
    ))
}

fn run_scan(
    config: &AppConfig,
    force_memory: bool,
    image: &Path,
    part: &str,
    text: Vec<String>,
    mock: bool,
    json: bool,
) -> Result<()> {
    let image_bytes =
        std::fs::read(image).with_context(|| format!("Failed to read image {:?}", image))?;

    let service = ScanService::new(
        build_ocr(config, text, mock),
        Arc::new(build_resolver(config)?),
        open_store(config, force_memory)?,
    );
    let outcome = service.scan(&image_bytes, part);
    let verdict = &outcome.verdict;

    if json {
        let output = serde_json::json!({
            "scan_id": outcome.scan_id,
            "persisted": outcome.persisted,
            "verdict": verdict,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Scan:        {}", outcome.scan_id);
    println!("Status:      {}", verdict.status);
    println!("Confidence:  {:.1}%", verdict.confidence);
    println!("Quality:     {}", verdict.detected_data.image_quality);
    println!(
        "Detected:    {}",
        if verdict.detected_data.detected_texts.is_empty() {
            "(nothing)".to_string()
        } else {
            verdict.detected_data.detected_texts.join(" | ")
        }
    );
    for issue in &verdict.issues {
        println!("  - {}", issue);
    }
    println!();
    println!("{}", verdict.explanation);
    if !outcome.persisted {
        println!("(warning: scan was not saved)");
    }
    Ok(())
}

fn run_lookup(config: &AppConfig, part: &str) -> Result<()> {
    let table = build_resolver(config)?;
    let record = table.resolve(part);

    println!("Part number:   {}", reference::normalize_part_number(part));
    println!("Manufacturer:  {}", record.manufacturer);
    println!("Expected logo: {}", record.expected_logo);
    println!("Description:   {}", record.description);

    if record.is_unknown() {
        let suggestions = table.suggest(part, 3);
        if suggestions.is_empty() {
            println!("Known part numbers: {}", table.part_numbers().join(", "));
        } else {
            println!("Did you mean: {}", suggestions.join(", "));
        }
    }
    Ok(())
}

fn print_history(history: &HistoryPage) {
    println!(
        "Page {} ({} per page, {} scans total)",
        history.page, history.limit, history.total
    );
    if history.scans.is_empty() {
        println!("  (no scans)");
        return;
    }
    for scan in &history.scans {
        println!(
            "  {}  {:<12} {:<22} {:>5.1}%  {}",
            scan.scanned_at, scan.part_number, scan.status, scan.confidence, scan.scan_id
        );
    }
}
