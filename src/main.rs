//! Patient record service entry point.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use patient_records::api::{create_router, AppState};
use patient_records::config::{Config, LogFormat};
use patient_records::error::ServiceError;
use patient_records::metrics;
use patient_records::store::{FileStore, PatientStore};
use patient_records::utils::shutdown_signal;

/// File-backed patient record service.
#[derive(Parser, Debug)]
#[command(name = "patient-records")]
#[command(about = "HTTP service for patient records with derived BMI and verdict")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Path of the patient JSON document.
    #[arg(long)]
    patients_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP server port.
        #[arg(short, long)]
        port: Option<u16>,

        /// Path of the patient JSON document.
        #[arg(long)]
        patients_file: Option<PathBuf>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Print every stored patient with derived metrics.
    Inspect {
        /// Path of the patient JSON document.
        #[arg(long)]
        patients_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Configuration is read before logging so LOG_FORMAT applies
    let config = Config::load();
    let log_format = config
        .as_ref()
        .map(|c| c.log_format)
        .unwrap_or_default();
    let verbose = args.verbose || config.as_ref().map(|c| c.verbose).unwrap_or(false);

    // Initialize logging
    let filter = if verbose {
        EnvFilter::new("patient_records=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let (text_layer, json_layer) = match log_format {
        LogFormat::Text => (Some(fmt::layer()), None),
        LogFormat::Json => (None, Some(fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(filter)
        .init();

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::Inspect { patients_file }) => {
            let config = loaded(config)?;
            cmd_inspect(config, patients_file.or(args.patients_file)).await
        }
        Some(Command::Serve {
            port,
            patients_file,
        }) => {
            let config = loaded(config)?;
            cmd_serve(
                config,
                port.or(args.port),
                patients_file.or(args.patients_file),
            )
            .await
        }
        None => {
            let config = loaded(config)?;
            cmd_serve(config, args.port, args.patients_file).await
        }
    }
}

fn loaded(config: Result<Config, envy::Error>) -> Result<Config, ServiceError> {
    config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        ServiceError::from(e)
    })
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("PATIENT RECORDS - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Check the patient file
    print!("Reading patient file... ");
    match FileStore::new(&config.patients_file).load_all() {
        Ok(collection) => {
            println!("OK");
            println!("  Patients: {}", collection.len());
        }
        Err(e) => {
            println!("UNAVAILABLE");
            println!("  {}", e);
            if config.init_store {
                println!("  An empty file will be created when the server starts.");
            }
        }
    }

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Patients File: {}", config.patients_file.display());
    println!("  Init Store: {}", config.init_store);
    println!("  Verdict Rule: {}", config.verdict_rule);
    println!("  Listen Address: {}", config.bind_addr());
    println!("  Log Level: {}", config.rust_log);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Print every stored patient with derived metrics.
async fn cmd_inspect(config: Config, patients_file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = patients_file.unwrap_or(config.patients_file);
    let collection = FileStore::new(&path).load_all()?;

    println!("======================================================================");
    println!("PATIENT RECORDS - {}", path.display());
    println!("======================================================================");
    println!(
        "{:<10} {:<24} {:>4} {:>7} {:>7} {:>7}  {}",
        "ID", "NAME", "AGE", "HEIGHT", "WEIGHT", "BMI", "VERDICT"
    );

    let mut verdicts: BTreeMap<String, usize> = BTreeMap::new();
    for patient in collection.iter() {
        let record = patient.record(config.verdict_rule);
        println!(
            "{:<10} {:<24} {:>4} {:>7.2} {:>7.1} {:>7.2}  {}",
            record.id,
            record.view.details.name,
            record.view.details.age,
            record.view.details.height,
            record.view.details.weight,
            record.view.bmi,
            record.view.verdict
        );
        *verdicts.entry(record.view.verdict.to_string()).or_default() += 1;
    }

    println!("----------------------------------------------------------------------");
    println!("Total: {} patients", collection.len());
    for (verdict, count) in &verdicts {
        println!("  {}: {}", verdict, count);
    }
    println!("======================================================================");

    Ok(())
}

/// Run the HTTP server.
async fn cmd_serve(
    mut config: Config,
    port: Option<u16>,
    patients_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    // Override with CLI args if provided
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(path) = patients_file {
        config.patients_file = path;
    }

    // Validate configuration
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        ServiceError::InvalidConfig(e)
    })?;

    info!("Configuration loaded successfully");
    info!("Patients file: {}", config.patients_file.display());
    info!("Verdict rule: {}", config.verdict_rule);

    // Initialize metrics
    let prometheus = metrics::install_prometheus()?;
    metrics::init_metrics();

    // Open the store, failing fast on an unreadable file
    let file = FileStore::new(&config.patients_file);
    if config.init_store {
        file.ensure_exists()?;
    }
    let patients = file.load_all()?.len();
    info!("Loaded {} patients", patients);

    let state = AppState::new(PatientStore::new(file), config.verdict_rule)
        .with_prometheus(prometheus);

    // Start HTTP server
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
