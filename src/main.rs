use anyhow::Context;
use clap::{Parser, Subcommand};
use fiberpath_studio::{
    init_logging, list_ports, open_session, Config, ExportOutcome, LogFormat, ProcessRunner,
    ProjectSession, RecentFiles,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fiberpath-studio")]
#[command(version, about, long_about = None)]
struct Opts {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (.toml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check a .wind file with the external validator
    Validate { wind: PathBuf },

    /// Validate a .wind file and plan it into G-code
    Export {
        wind: PathBuf,
        /// G-code destination; the validated .wind is written next to it
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Render the first layers of a .wind file to a PNG
    Preview {
        wind: PathBuf,
        /// Number of leading layers to draw; all when omitted
        #[arg(long)]
        layers: Option<usize>,
    },

    /// Simulate a G-code program
    Simulate { gcode: PathBuf },

    /// Render a G-code program to a PNG
    Plot {
        gcode: PathBuf,
        #[arg(long, default_value_t = 0.8)]
        scale: f64,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Stream a G-code program to the controller
    Stream {
        gcode: PathBuf,
        /// Serial port; falls back to the configured port
        #[arg(long)]
        port: Option<String>,
        /// Baud rate; falls back to the configured rate
        #[arg(long)]
        baud_rate: Option<u32>,
        /// Walk the program without sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// List serial ports
    Ports,

    /// Show or clear the recent files list
    Recent {
        #[arg(long)]
        clear: bool,
    },

    /// Write the current configuration to the config file
    InitConfig,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn open_project(
    config: &Config,
    wind: &std::path::Path,
) -> anyhow::Result<ProjectSession<ProcessRunner>> {
    let mut session = open_session(config)?;
    session
        .open(wind, &mut |_: &str| true)
        .await
        .with_context(|| format!("opening {}", wind.display()))?;
    Ok(session)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    init_logging(if opts.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    })?;

    let config_path = match opts.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load_or_default(&config_path)?;
    tracing::debug!(?config, "Configuration loaded");

    match opts.command {
        Command::Validate { wind } => {
            let session = open_project(&config, &wind).await?;
            let report = session.validate().await?;
            print_json(&report)?;
            if !report.valid {
                std::process::exit(1);
            }
        }
        Command::Export { wind, output } => {
            let session = open_project(&config, &wind).await?;
            match session.export_gcode(&output).await? {
                ExportOutcome::Exported { plan, .. } => print_json(&plan)?,
                ExportOutcome::Invalid(report) => {
                    print_json(&report)?;
                    std::process::exit(1);
                }
            }
        }
        Command::Preview { wind, layers } => {
            let session = open_project(&config, &wind).await?;
            let preview = session.preview(layers).await?;
            for warning in &preview.warnings {
                tracing::warn!("{}", warning);
            }
            println!("{}", preview.path.display());
        }
        Command::Simulate { gcode } => {
            let session = open_session(&config)?;
            print_json(&session.simulate(&gcode).await?)?;
        }
        Command::Plot {
            gcode,
            scale,
            output,
        } => {
            let session = open_session(&config)?;
            let preview = session
                .gateway()
                .plot_preview(&gcode, scale, output.as_deref())
                .await?;
            for warning in &preview.warnings {
                tracing::warn!("{}", warning);
            }
            println!("{}", preview.path.display());
        }
        Command::Stream {
            gcode,
            port,
            baud_rate,
            dry_run,
        } => {
            let session = open_session(&config)?;
            let port = port.or_else(|| config.stream.port.clone());
            let baud_rate = baud_rate.unwrap_or(config.stream.baud_rate);
            let summary = session
                .stream(&gcode, port.as_deref(), baud_rate, dry_run)
                .await?;
            print_json(&summary)?;
        }
        Command::Ports => {
            print_json(&list_ports()?)?;
        }
        Command::Recent { clear } => {
            let mut recent =
                RecentFiles::open(RecentFiles::default_path()?, config.files.recent_files_count)?;
            if clear {
                recent.clear()?;
            }
            print_json(&recent.list())?;
        }
        Command::InitConfig => {
            config.save_to_file(&config_path)?;
            println!("{}", config_path.display());
        }
    }

    Ok(())
}
