//! Wind definition document and its mapping to and from [`crate::project::Project`].

pub mod converter;
pub mod schema;

pub use converter::{
    layer_from_wire, layer_to_wire, load_project_from_str, project_to_wind_definition,
    wind_definition_to_project,
};
pub use schema::{
    MandrelParameters, TowParameters, WindDefinition, WindLayer, WireHelical, WireHoop, WireSkip,
    DEFAULT_FEED_RATE,
};
