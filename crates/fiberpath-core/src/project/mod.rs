//! In-memory winding project: model, layer variants and field validation.

pub mod layer;
pub mod model;
pub mod validation;

pub use layer::{
    HelicalLayer, HelicalPatch, HoopLayer, HoopPatch, Layer, LayerId, LayerKind, LayerPatch,
    LayerType, SkipLayer, SkipPatch,
};
pub use model::{AxisFormat, Mandrel, MandrelPatch, Project, Tow, TowPatch};
pub use validation::{FieldErrors, HelicalField, MandrelField, TowField};
