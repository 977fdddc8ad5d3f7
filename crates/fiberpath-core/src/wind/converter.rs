//! Conversion between the project model and the wind definition document.

use super::schema::{
    MandrelParameters, TowParameters, WindDefinition, WindLayer, WireHelical, WireHoop, WireSkip,
    DEFAULT_FEED_RATE,
};
use crate::error::WindFileError;
use crate::project::{HelicalLayer, HoopLayer, Layer, LayerKind, Mandrel, Project, SkipLayer, Tow};
use std::path::PathBuf;

/// Map one layer payload to its wire shape
pub fn layer_to_wire(kind: &LayerKind) -> WindLayer {
    match kind {
        LayerKind::Hoop(h) => WindLayer::Hoop(WireHoop {
            terminal: h.terminal,
        }),
        LayerKind::Helical(h) => WindLayer::Helical(WireHelical {
            wind_angle: h.wind_angle,
            pattern_number: h.pattern_number,
            skip_index: h.skip_index,
            lock_degrees: h.lock_degrees,
            lead_in_mm: h.lead_in_mm,
            lead_out_degrees: h.lead_out_degrees,
            skip_initial_near_lock: h.skip_initial_near_lock,
        }),
        LayerKind::Skip(s) => WindLayer::Skip(WireSkip {
            mandrel_rotation: s.mandrel_rotation,
        }),
    }
}

/// Map one wire layer to a layer payload
pub fn layer_from_wire(layer: &WindLayer) -> LayerKind {
    match layer {
        WindLayer::Hoop(h) => LayerKind::Hoop(HoopLayer {
            terminal: h.terminal,
        }),
        WindLayer::Helical(h) => LayerKind::Helical(HelicalLayer {
            wind_angle: h.wind_angle,
            pattern_number: h.pattern_number,
            skip_index: h.skip_index,
            lock_degrees: h.lock_degrees,
            lead_in_mm: h.lead_in_mm,
            lead_out_degrees: h.lead_out_degrees,
            skip_initial_near_lock: h.skip_initial_near_lock,
        }),
        WindLayer::Skip(s) => LayerKind::Skip(SkipLayer {
            mandrel_rotation: s.mandrel_rotation,
        }),
    }
}

/// Build the wind definition for a project
///
/// With `visible_layer_count` only the first `n` layers are exported, which
/// is what partial previews use.
pub fn project_to_wind_definition(
    project: &Project,
    visible_layer_count: Option<usize>,
) -> WindDefinition {
    let count = visible_layer_count.unwrap_or(project.layers.len());

    WindDefinition {
        mandrel_parameters: MandrelParameters {
            diameter: project.mandrel.diameter,
            wind_length: project.mandrel.wind_length,
        },
        tow_parameters: TowParameters {
            width: project.tow.width,
            thickness: project.tow.thickness,
        },
        default_feed_rate: DEFAULT_FEED_RATE,
        layers: project
            .layers
            .iter()
            .take(count)
            .map(|layer| layer_to_wire(layer.kind()))
            .collect(),
    }
}

/// Build a freshly loaded project from a wind definition
///
/// The result is clean and remembers `file_path`. Every layer receives a
/// new id.
pub fn wind_definition_to_project(def: &WindDefinition, file_path: impl Into<PathBuf>) -> Project {
    if def.default_feed_rate != DEFAULT_FEED_RATE {
        tracing::warn!(
            feed_rate = def.default_feed_rate,
            "defaultFeedRate is not editable; {} will be written on save",
            DEFAULT_FEED_RATE
        );
    }

    Project {
        file_path: Some(file_path.into()),
        is_dirty: false,
        mandrel: Mandrel {
            diameter: def.mandrel_parameters.diameter,
            wind_length: def.mandrel_parameters.wind_length,
        },
        tow: Tow {
            width: def.tow_parameters.width,
            thickness: def.tow_parameters.thickness,
        },
        layers: def
            .layers
            .iter()
            .map(|l| Layer::with_kind(layer_from_wire(l)))
            .collect(),
        active_layer_id: None,
        ..Project::default()
    }
}

/// Parse `.wind` text and convert it into a project in one step
pub fn load_project_from_str(
    content: &str,
    file_path: impl Into<PathBuf>,
) -> Result<Project, WindFileError> {
    let def = WindDefinition::parse(content)?;
    Ok(wind_definition_to_project(&def, file_path))
}
