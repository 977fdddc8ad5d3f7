//! # FiberPath Studio
//!
//! Project editor and command front-end for the FiberPath filament winding
//! toolchain:
//! - Edit mandrel, tow and an ordered sequence of hoop, helical and skip layers
//! - Open and save `.wind` definitions
//! - Validate, plan, simulate, plot and stream through the `fiberpath` CLI
//!
//! ## Architecture
//!
//! FiberPath Studio is organized as a workspace with multiple crates:
//!
//! 1. **fiberpath-core** - Project model, validation, `.wind` format, project store
//! 2. **fiberpath-communication** - Retry-wrapped command gateway, serial port discovery
//! 3. **fiberpath-settings** - Configuration file and recent-files list
//! 4. **fiberpath-studio** - Project session and the headless command driver

pub mod session;

pub use session::{DiscardPrompt, ExportOutcome, ProjectSession, SaveOutcome};

pub use fiberpath_core::{
    AxisFormat, CommandError, Error, FieldErrors, Layer, LayerId, LayerKind, LayerPatch,
    LayerType, Project, ProjectEvent, ProjectStore, Result, WindDefinition, WindFileError,
};

pub use fiberpath_communication::{
    list_ports, CliRunner, ControllerBoard, FiberpathGateway, GatewayOptions, OperationPolicies,
    PlanSummary, PlotPreview, ProcessRunner, RetryPolicy, SerialPortInfo, SimulationSummary,
    StreamSummary, ValidationReport,
};

pub use fiberpath_settings::{Config, RecentFiles, SettingsError};

use std::time::Duration;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Initialize logging
///
/// Sets up structured logging with:
/// - Output on stderr, leaving stdout for command results
/// - RUST_LOG environment variable support, `info` when unset
/// - Pretty or JSON formatting
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_thread_names(true)
                .with_line_number(true)
                .pretty();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .json()
                .with_current_span(false);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}

/// Gateway options described by the configuration file
pub fn gateway_options(config: &Config) -> GatewayOptions {
    let retry = &config.retry;
    GatewayOptions {
        policies: OperationPolicies {
            default: RetryPolicy::new(
                retry.max_attempts,
                Duration::from_millis(retry.base_delay_ms),
                retry.backoff_multiplier,
            ),
            plan_max_attempts: retry.plan_max_attempts,
            validate_max_attempts: retry.validate_max_attempts,
        },
        reject_duplicates: config.cli.reject_duplicate_calls,
        ..GatewayOptions::default()
    }
}

/// Locate the CLI and build a session around it
///
/// The recent-files list lives next to the configuration file. If it
/// cannot be read the session starts with an empty in-memory list. New
/// and opened projects take the configured axis format.
pub fn open_session(config: &Config) -> Result<ProjectSession<ProcessRunner>> {
    let runner = ProcessRunner::resolve(config.cli.executable.as_deref())?;
    let gateway = FiberpathGateway::with_options(runner, gateway_options(config));

    let capacity = config.files.recent_files_count;
    let recent = match RecentFiles::default_path().and_then(|p| RecentFiles::open(p, capacity)) {
        Ok(recent) => recent,
        Err(e) => {
            tracing::warn!("Recent files unavailable: {}", e);
            RecentFiles::new(capacity)
        }
    };

    Ok(ProjectSession::new(gateway, recent).with_default_axis_format(config.project.axis_format))
}
