//! Project aggregate: mandrel, tow, ordered layer stack and document metadata.

use super::layer::{Layer, LayerId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Mandrel geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mandrel {
    /// Diameter in mm
    pub diameter: f64,
    /// Windable length in mm
    pub wind_length: f64,
}

impl Default for Mandrel {
    fn default() -> Self {
        Self {
            diameter: 100.0,
            wind_length: 200.0,
        }
    }
}

/// Partial update of the mandrel record
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MandrelPatch {
    pub diameter: Option<f64>,
    pub wind_length: Option<f64>,
}

impl Mandrel {
    /// Merge the fields present in `patch`
    pub fn apply(&mut self, patch: &MandrelPatch) {
        if let Some(v) = patch.diameter {
            self.diameter = v;
        }
        if let Some(v) = patch.wind_length {
            self.wind_length = v;
        }
    }
}

/// Fiber tow dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tow {
    /// Band width in mm
    pub width: f64,
    /// Band thickness in mm
    pub thickness: f64,
}

impl Default for Tow {
    fn default() -> Self {
        Self {
            width: 3.0,
            thickness: 0.25,
        }
    }
}

/// Partial update of the tow record
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TowPatch {
    pub width: Option<f64>,
    pub thickness: Option<f64>,
}

impl Tow {
    /// Merge the fields present in `patch`
    pub fn apply(&mut self, patch: &TowPatch) {
        if let Some(v) = patch.width {
            self.width = v;
        }
        if let Some(v) = patch.thickness {
            self.thickness = v;
        }
    }
}

/// Output coordinate convention forwarded to the planner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisFormat {
    /// Carriage X, mandrel A, delivery head B
    #[default]
    Xab,
    /// Legacy XYZ mapping
    Xyz,
}

impl AxisFormat {
    /// Name used on the CLI command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xab => "xab",
            Self::Xyz => "xyz",
        }
    }
}

impl fmt::Display for AxisFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AxisFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xab" => Ok(Self::Xab),
            "xyz" => Ok(Self::Xyz),
            other => Err(format!("unknown axis format '{}'", other)),
        }
    }
}

/// A winding project
///
/// `layers` order is the winding order. `active_layer_id` is a weak
/// reference: it is resolved against `layers` on every use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub file_path: Option<PathBuf>,
    pub is_dirty: bool,
    pub mandrel: Mandrel,
    pub tow: Tow,
    pub layers: Vec<Layer>,
    pub active_layer_id: Option<LayerId>,
    pub axis_format: AxisFormat,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            file_path: None,
            is_dirty: false,
            mandrel: Mandrel::default(),
            tow: Tow::default(),
            layers: Vec::new(),
            active_layer_id: None,
            axis_format: AxisFormat::default(),
        }
    }
}

impl Project {
    /// Create an empty, unsaved project
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a layer by id
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    /// Position of a layer in the winding sequence
    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id() == id)
    }

    /// Resolve the active layer, if it still exists
    pub fn active_layer(&self) -> Option<&Layer> {
        self.active_layer_id.and_then(|id| self.layer(id))
    }

    /// Display name for a title bar: file name or "Untitled", `*` when dirty
    pub fn display_name(&self) -> String {
        let name = self
            .file_path
            .as_ref()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("Untitled");

        if self.is_dirty {
            format!("{}*", name)
        } else {
            name.to_string()
        }
    }
}
