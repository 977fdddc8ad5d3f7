//! The command gateway: typed, retry-wrapped calls into the `fiberpath` CLI.

use super::operation::{InFlightGuard, InFlightTicket, Operation, OperationPolicies};
use super::responses::{
    PlanSummary, PlotPreview, SimulationSummary, StreamSummary, ValidationReport,
};
use super::retry::retry;
use super::runner::CliRunner;
use fiberpath_core::{AxisFormat, CommandError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Gateway construction options
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub policies: OperationPolicies,
    /// Reject a second call of the same kind while one is running
    pub reject_duplicates: bool,
    /// Where generated `.gcode`, `.png` and scratch `.wind` files go
    pub temp_dir: PathBuf,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            policies: OperationPolicies::default(),
            reject_duplicates: false,
            temp_dir: std::env::temp_dir(),
        }
    }
}

/// Retry-wrapped access to the external planner, simulator, plotter and
/// streamer
pub struct FiberpathGateway<R: CliRunner> {
    runner: R,
    policies: OperationPolicies,
    in_flight: Option<InFlightGuard>,
    temp_dir: PathBuf,
}

impl<R: CliRunner> FiberpathGateway<R> {
    pub fn new(runner: R) -> Self {
        Self::with_options(runner, GatewayOptions::default())
    }

    pub fn with_options(runner: R, options: GatewayOptions) -> Self {
        Self {
            runner,
            policies: options.policies,
            in_flight: options.reject_duplicates.then(InFlightGuard::new),
            temp_dir: options.temp_dir,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn policies(&self) -> &OperationPolicies {
        &self.policies
    }

    /// Plan G-code from a `.wind` file
    ///
    /// Without `output_path` the G-code goes to a fresh temporary file.
    pub async fn plan_wind(
        &self,
        input_path: &Path,
        output_path: Option<&Path>,
        axis_format: Option<AxisFormat>,
    ) -> Result<PlanSummary, CommandError> {
        let output = output_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.temp_path("gcode"));
        let mut args = vec![
            "plan".to_string(),
            path_arg(input_path),
            "--output".to_string(),
            path_arg(&output),
            "--json".to_string(),
        ];
        if let Some(format) = axis_format {
            args.push("--axis-format".to_string());
            args.push(format.to_string());
        }

        self.dispatch(Operation::Plan, || self.plan_once(&args, &output))
            .await
    }

    /// Validate a serialized wind definition with the external validator
    pub async fn validate_wind_definition(
        &self,
        definition_json: &str,
    ) -> Result<ValidationReport, CommandError> {
        self.dispatch(Operation::Validate, move || async move {
            let scratch = ScratchFile::write(self.temp_path("wind"), definition_json).await?;
            let args = vec![
                "validate".to_string(),
                path_arg(scratch.path()),
                "--json".to_string(),
            ];
            let output = self.runner.run(&args).await;
            scratch.remove().await;
            let output = output?;

            match serde_json::from_str::<Value>(output.stdout.trim()) {
                Ok(value) if value.is_object() => ValidationReport::from_wire(&value),
                _ if output.success() => Ok(ValidationReport::ok()),
                _ => Err(output.exit_error()),
            }
        })
        .await
    }

    /// Simulate a G-code program
    pub async fn simulate_program(
        &self,
        gcode_path: &Path,
    ) -> Result<SimulationSummary, CommandError> {
        let args = vec![
            "simulate".to_string(),
            path_arg(gcode_path),
            "--json".to_string(),
        ];
        self.dispatch(Operation::Simulate, || self.run_json(&args))
            .await
    }

    /// Render a G-code program to a PNG
    pub async fn plot_preview(
        &self,
        gcode_path: &Path,
        scale: f64,
        output_path: Option<&Path>,
    ) -> Result<PlotPreview, CommandError> {
        let output = output_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.temp_path("png"));
        let args = vec![
            "plot".to_string(),
            path_arg(gcode_path),
            "--output".to_string(),
            path_arg(&output),
            "--scale".to_string(),
            scale.to_string(),
        ];
        self.dispatch(Operation::PlotPreview, || self.plot_once(&args, &output))
            .await
    }

    /// Render the first `visible_layer_count` layers of a definition to a PNG
    pub async fn plot_definition(
        &self,
        definition_json: &str,
        visible_layer_count: usize,
        output_path: Option<&Path>,
    ) -> Result<PlotPreview, CommandError> {
        let output = output_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.temp_path("png"));
        let output = output.as_path();

        self.dispatch(Operation::PlotDefinition, move || async move {
            let scratch = ScratchFile::write(self.temp_path("wind"), definition_json).await?;
            let args = vec![
                "plot-definition".to_string(),
                path_arg(scratch.path()),
                "--output".to_string(),
                path_arg(output),
                "--layers".to_string(),
                visible_layer_count.to_string(),
            ];
            let result = self.plot_once(&args, output).await;
            scratch.remove().await;
            result
        })
        .await
    }

    /// Stream a G-code program to a controller, or rehearse it with `dry_run`
    ///
    /// Never retried.
    pub async fn stream_program(
        &self,
        gcode_path: &Path,
        port: Option<&str>,
        baud_rate: u32,
        dry_run: bool,
    ) -> Result<StreamSummary, CommandError> {
        let mut args = vec![
            "stream".to_string(),
            path_arg(gcode_path),
            "--baud-rate".to_string(),
            baud_rate.to_string(),
            "--json".to_string(),
        ];
        if dry_run {
            args.push("--dry-run".to_string());
        } else if let Some(port) = port {
            args.push("--port".to_string());
            args.push(port.to_string());
        }
        self.dispatch(Operation::Stream, || self.run_json(&args))
            .await
    }

    /// Write file content verbatim. Never retried.
    pub async fn save_wind_file(&self, path: &Path, content: &str) -> Result<(), CommandError> {
        self.dispatch(Operation::SaveFile, move || async move {
            tokio::fs::write(path, content)
                .await
                .map_err(|e| CommandError::file(format!("{}: {}", path.display(), e)))
        })
        .await?;
        tracing::info!("Saved {}", path.display());
        Ok(())
    }

    /// Read file content as UTF-8. Never retried.
    pub async fn load_wind_file(&self, path: &Path) -> Result<String, CommandError> {
        self.dispatch(Operation::LoadFile, move || async move {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| CommandError::file(format!("{}: {}", path.display(), e)))
        })
        .await
    }

    /// Unique path in the gateway's temp directory
    pub fn temp_path(&self, extension: &str) -> PathBuf {
        self.temp_dir
            .join(format!("fiberpath-{}.{}", Uuid::new_v4(), extension))
    }

    async fn dispatch<T, F, Fut>(&self, operation: Operation, call: F) -> Result<T, CommandError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CommandError>>,
    {
        let _ticket: Option<InFlightTicket> = match &self.in_flight {
            Some(guard) => Some(guard.try_begin(operation)?),
            None => None,
        };
        let policy = self.policies.policy_for(operation);
        tracing::debug!(operation = operation.as_str(), "Dispatching");
        retry(&policy, operation.as_str(), call).await
    }

    async fn run_json<T: DeserializeOwned>(&self, args: &[String]) -> Result<T, CommandError> {
        let output = self.runner.run(args).await?.check()?;
        serde_json::from_str(output.stdout.trim()).map_err(CommandError::invalid_response)
    }

    async fn plan_once(&self, args: &[String], output: &Path) -> Result<PlanSummary, CommandError> {
        let mut payload: Value = self.run_json(args).await?;
        if let Value::Object(obj) = &mut payload {
            obj.entry("output")
                .or_insert_with(|| Value::String(path_arg(output)));
        }
        serde_json::from_value(payload).map_err(CommandError::invalid_response)
    }

    async fn plot_once(&self, args: &[String], output: &Path) -> Result<PlotPreview, CommandError> {
        let result = self.runner.run(args).await?.check()?;
        let bytes = tokio::fs::read(output)
            .await
            .map_err(|e| CommandError::file(format!("{}: {}", output.display(), e)))?;
        PlotPreview::from_png(output, &bytes, &result.stderr)
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Temporary `.wind` document handed to the CLI
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    async fn write(path: PathBuf, content: &str) -> Result<Self, CommandError> {
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| CommandError::file(format!("{}: {}", path.display(), e)))?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn remove(self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            tracing::debug!("Could not remove {}: {}", self.path.display(), e);
        }
    }
}
