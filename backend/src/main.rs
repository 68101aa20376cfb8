//! Liftsim CLI - Run and observe elevator dispatch simulations
//!
//! # Commands
//!
//! ```bash
//! liftsim serve                          # HTTP server + live simulation (port 3000)
//! liftsim simulate --ticks 600           # Offline run, JSON summary on stdout
//! liftsim monitor run.jsonl --follow     # Replay or tail a journal
//! liftsim config                         # Print the default configuration
//! ```

use clap::{Parser, Subcommand};
use liftsim::{
    monitor, ConsoleLogger, JournalWriter, OfflineSimulator, SimulationConfig, TripCounter,
};
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "liftsim")]
#[command(about = "Event-driven elevator dispatch simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server with a live simulation
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Simulation config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory with the built web shell
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Run a simulation offline, as fast as possible
    Simulate {
        /// Last clock tick to simulate
        #[arg(short, long, default_value = "600")]
        ticks: i64,

        /// Requests file: [{ "at", "origin", "destination" }]
        #[arg(short, long)]
        requests: Option<PathBuf>,

        /// Write every event to a JSON-lines journal
        #[arg(short, long)]
        journal: Option<PathBuf>,

        /// Simulation config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Replay a journal through the logging and watchdog reactors
    Monitor {
        /// Journal file (JSON lines)
        journal: PathBuf,

        /// Keep reading as the journal grows, until Ctrl-C
        #[arg(short, long)]
        follow: bool,
    },

    /// Print the default configuration
    Config,
}

/// One line of a requests file.
#[derive(Debug, Deserialize)]
struct ScheduledRequest {
    at: i64,
    origin: i32,
    destination: i32,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    if let Err(e) = ConsoleLogger::init(ConsoleLogger::level_from_env()) {
        eprintln!("Logger already installed: {}", e);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            port,
            config,
            static_dir,
        } => cmd_serve(port, config.as_deref(), static_dir).await,

        Commands::Simulate {
            ticks,
            requests,
            journal,
            config,
        } => cmd_simulate(
            ticks,
            requests.as_deref(),
            journal.as_deref(),
            config.as_deref(),
        ),

        Commands::Monitor { journal, follow } => cmd_monitor(journal, follow).await,

        Commands::Config => cmd_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_serve(
    port: u16,
    config: Option<&Path>,
    static_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = SimulationConfig::resolve(config)?;
    liftsim::start_server(port, config, static_dir).await?;
    Ok(())
}

fn cmd_simulate(
    ticks: i64,
    requests: Option<&Path>,
    journal: Option<&Path>,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = SimulationConfig::resolve(config)?;

    let counter = Arc::new(TripCounter::new());
    let mut builder = config.building_builder().reactor(counter.clone());

    let writer = match journal {
        Some(path) => {
            let writer = Arc::new(JournalWriter::create(path)?);
            builder = builder.reactor(writer.clone());
            Some(writer)
        }
        None => None,
    };

    let building = builder.build()?;

    if let Some(path) = requests {
        let content = fs::read_to_string(path)?;
        let requests: Vec<ScheduledRequest> = serde_json::from_str(&content)?;
        eprintln!("Scheduling {} requests from {}", requests.len(), path.display());
        for r in &requests {
            building.request_at(r.at, r.origin, r.destination)?;
        }
    }

    let simulator = OfflineSimulator::new(building.bus().clone());
    let dispatched = simulator.run_to(ticks);

    let summary = json!({
        "ticks": simulator.clock(),
        "eventsDispatched": dispatched,
        "journalLines": writer.as_ref().map(|w| w.written()),
        "trips": counter.summary(),
        "building": building.snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

async fn cmd_monitor(journal: PathBuf, follow: bool) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Arc::new(AtomicBool::new(false));

    if follow {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.store(true, Ordering::Release);
            }
        });
    }

    let replayed =
        tokio::task::spawn_blocking(move || monitor(&journal, follow, &shutdown)).await??;
    eprintln!("Replayed {} events", replayed);

    Ok(())
}

fn cmd_config() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&SimulationConfig::default())?);
    Ok(())
}
