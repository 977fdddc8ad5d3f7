//! Typed results of gateway calls.

use base64::{engine::general_purpose::STANDARD as Base64, Engine};
use fiberpath_core::CommandError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Result of `fiberpath plan`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    /// Path the G-code was written to
    pub output: String,
    /// Number of G-code commands emitted
    pub commands: u64,
    /// Per-layer metrics as reported by the planner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tow_meters: Option<f64>,
}

/// One problem reported by the external validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Offending field path; empty when the problem is document-wide
    #[serde(default)]
    pub field: String,
    pub message: String,
}

/// Canonical validation outcome
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// A passing report with no issues
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// Normalise a validator response
    ///
    /// Compatibility shim: the validator answers either `{"valid": bool}` or
    /// `{"status": "ok"}`. A boolean `valid` takes precedence; otherwise
    /// any status other than `ok` counts as invalid. A response carrying
    /// neither key is rejected.
    pub fn from_wire(value: &Value) -> Result<Self, CommandError> {
        let obj = value.as_object().ok_or_else(|| {
            CommandError::invalid_response("validation response is not an object")
        })?;

        let valid = match (obj.get("valid"), obj.get("status")) {
            (Some(Value::Bool(valid)), _) => *valid,
            (_, Some(Value::String(status))) => status.eq_ignore_ascii_case("ok"),
            _ => {
                return Err(CommandError::invalid_response(
                    "validation response has neither `valid` nor `status`",
                ))
            }
        };

        let errors = match obj.get("errors") {
            None | Some(Value::Null) => Vec::new(),
            Some(errors) => serde_json::from_value(errors.clone())
                .map_err(CommandError::invalid_response)?,
        };

        Ok(Self { valid, errors })
    }

    /// Issues rendered one per line as `field: message`
    pub fn describe(&self) -> String {
        self.errors
            .iter()
            .map(|issue| {
                if issue.field.is_empty() {
                    issue.message.clone()
                } else {
                    format!("{}: {}", issue.field, issue.message)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Result of `fiberpath simulate`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSummary {
    #[serde(alias = "commandsExecuted")]
    pub commands_executed: u64,
    pub moves: u64,
    #[serde(alias = "estimatedTimeS")]
    pub estimated_time_s: f64,
    #[serde(alias = "totalDistanceMm")]
    pub total_distance_mm: f64,
    #[serde(alias = "averageFeedRateMmpm")]
    pub average_feed_rate_mmpm: f64,
    #[serde(alias = "towLengthMm")]
    pub tow_length_mm: f64,
}

/// Rendered preview image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotPreview {
    /// Where the PNG was written
    pub path: PathBuf,
    /// PNG contents, base64 encoded
    pub image_base64: String,
    /// Non-fatal notes the plotter printed on stderr
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl PlotPreview {
    /// Build a preview from the PNG bytes and the plotter's stderr
    pub fn from_png(
        path: impl Into<PathBuf>,
        bytes: &[u8],
        stderr: &str,
    ) -> Result<Self, CommandError> {
        let path = path.into();
        if bytes.is_empty() {
            return Err(CommandError::file(format!(
                "plot image {} is empty",
                path.display()
            )));
        }
        Ok(Self {
            path,
            image_base64: Base64.encode(bytes),
            warnings: stderr
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect(),
        })
    }

    /// Decoded PNG bytes
    pub fn image_bytes(&self) -> Result<Vec<u8>, CommandError> {
        Base64
            .decode(&self.image_base64)
            .map_err(CommandError::invalid_response)
    }
}

/// Result of `fiberpath stream`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    pub status: String,
    /// Commands sent
    pub commands: u64,
    /// Commands in the program
    pub total: u64,
    pub baud_rate: u32,
    pub dry_run: bool,
}
