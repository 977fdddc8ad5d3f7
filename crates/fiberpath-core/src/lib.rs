//! # FiberPath Core
//!
//! Project model and document handling for FiberPath Studio.
//! Provides the winding project representation, the three layer variants,
//! field validation, the `.wind` wire format and the project store.

pub mod error;
pub mod project;
pub mod store;
pub mod wind;

pub use error::{CommandError, Error, Result, WindFileError};

pub use project::{
    AxisFormat, FieldErrors, HelicalLayer, HelicalPatch, HoopLayer, HoopPatch, Layer, LayerId,
    LayerKind, LayerPatch, LayerType, Mandrel, MandrelPatch, Project, SkipLayer, SkipPatch, Tow,
    TowPatch,
};

pub use store::{EventCategory, EventFilter, ProjectEvent, ProjectStore, SubscriptionId};

pub use wind::{
    load_project_from_str, project_to_wind_definition, wind_definition_to_project,
    WindDefinition, WindLayer, DEFAULT_FEED_RATE,
};
