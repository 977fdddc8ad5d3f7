//! Wind definition wire format
//!
//! The `.wind` document is owned by the external planner. Key names and
//! key order are part of that contract: serde emits fields in declaration
//! order, so the structs below are declared in the order the planner
//! expects.

use crate::error::WindFileError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Feed rate written into every exported definition, mm/min
pub const DEFAULT_FEED_RATE: f64 = 2000.0;

/// Known `windType` tags
pub const WIND_TYPES: [&str; 3] = ["hoop", "helical", "skip"];

/// Top-level `.wind` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindDefinition {
    pub mandrel_parameters: MandrelParameters,
    pub tow_parameters: TowParameters,
    pub default_feed_rate: f64,
    pub layers: Vec<WindLayer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MandrelParameters {
    pub diameter: f64,
    pub wind_length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TowParameters {
    pub width: f64,
    pub thickness: f64,
}

/// One layer entry, discriminated by `windType`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "windType", rename_all = "lowercase")]
pub enum WindLayer {
    Hoop(WireHoop),
    Helical(WireHelical),
    Skip(WireSkip),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireHoop {
    #[serde(default)]
    pub terminal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireHelical {
    pub wind_angle: f64,
    pub pattern_number: u32,
    pub skip_index: u32,
    pub lock_degrees: f64,
    #[serde(rename = "leadInMM")]
    pub lead_in_mm: f64,
    pub lead_out_degrees: f64,
    #[serde(default)]
    pub skip_initial_near_lock: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSkip {
    pub mandrel_rotation: f64,
}

impl WindDefinition {
    /// Parse a `.wind` document
    ///
    /// Layer tags are checked before typed deserialization so that an
    /// unknown `windType` is reported as such rather than as a generic
    /// shape error.
    pub fn parse(content: &str) -> Result<Self, WindFileError> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| WindFileError::InvalidJson {
                reason: e.to_string(),
            })?;

        if !value.is_object() {
            return Err(WindFileError::InvalidJson {
                reason: "top-level value is not an object".to_string(),
            });
        }

        if let Some(layers) = value.get("layers").and_then(Value::as_array) {
            for (index, layer) in layers.iter().enumerate() {
                match layer.get("windType").and_then(Value::as_str) {
                    None => return Err(WindFileError::MissingWindType { index }),
                    Some(tag) if !WIND_TYPES.contains(&tag) => {
                        return Err(WindFileError::UnknownWindType {
                            index,
                            wind_type: tag.to_string(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        serde_json::from_value(value).map_err(|e| WindFileError::Malformed {
            reason: e.to_string(),
        })
    }

    /// Compact single-line JSON, as sent to the validator and plotter
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Two-space indented JSON, as written to `.wind` files
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
