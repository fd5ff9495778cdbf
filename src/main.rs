//! Pluto TV EPG ingestion
//! Fetches the channel schedule, keeps a throttled local program store and
//! exports it as XMLTV.

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod epg;
mod error;
mod store;

use api::{ClientConfig, PlutoClient};
use config::AppConfig;
use epg::{format_datetime, write_xmltv, ProgramStore, RefreshOutcome, Refresher};
use error::EpgError;
use error::Result;
use store::JsonStore;

#[derive(Parser, Debug)]
#[command(name = "plutotv-epg", version, about = "Pluto TV schedule ingestion and XMLTV export")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh the program store if the minimum refresh interval has passed
    Refresh {
        /// Instance to refresh; all configured instances when omitted
        #[arg(long)]
        instance: Option<String>,
    },
    /// Write stored programs as XMLTV
    Export {
        #[arg(long, default_value = "default")]
        instance: String,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write the effective configuration to the user config directory
    Init,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };
    if let Command::Init = cli.command {
        let path = config.save()?;
        info!("Wrote {}", path.display());
        return Ok(());
    }

    let store = JsonStore::open(config.store_path())?;
    info!("Using program store {}", store.path().display());

    match cli.command {
        Command::Refresh { instance } => {
            let instances: Vec<String> = match instance {
                Some(name) => vec![name],
                None => config.instances.keys().cloned().collect(),
            };
            let client = PlutoClient::new(ClientConfig::from(&config));
            let mut refresher = Refresher::new(config, client, store);
            refresh_instances(&instances, |name| refresher.refresh(name))
        }
        Command::Export { instance, output } => {
            config.instance(&instance)?;
            let programs = store.programs(&config.source_name, &instance);
            if let (Some(first), Some(last)) = (programs.first(), programs.last()) {
                info!(
                    "Exporting {} programs ({} .. {})",
                    programs.len(),
                    format_datetime(&first.start),
                    format_datetime(&last.stop)
                );
            }

            let generator = format!("plutotv_epg {}", env!("CARGO_PKG_VERSION"));
            match output {
                Some(path) => {
                    let mut out = BufWriter::new(File::create(&path)?);
                    write_xmltv(&mut out, &generator, &programs)?;
                    out.flush()?;
                    info!("Wrote {}", path.display());
                    Ok(())
                }
                None => write_xmltv(io::stdout().lock(), &generator, &programs),
            }
        }
        Command::Init => Ok(()),
    }
}

/// Refresh every instance; a failing instance does not stop the rest.
/// Returns the first error once all instances have been attempted.
fn refresh_instances<F>(instances: &[String], mut refresh: F) -> Result<()>
where
    F: FnMut(&str) -> Result<RefreshOutcome>,
{
    let mut first_error: Option<EpgError> = None;
    for name in instances {
        match refresh(name) {
            Ok(RefreshOutcome::NotDue) => info!("{}: EPG is up to date", name),
            Ok(RefreshOutcome::Disabled) => info!("{}: EPG collection disabled", name),
            Ok(RefreshOutcome::Refreshed(days)) => {
                for (day, count) in days {
                    info!("{}: saved {} programs for {}", name, count, day);
                }
            }
            Err(e) => {
                error!("{}: refresh failed: {}", name, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
