//! Project store notifications.

use crate::project::{AxisFormat, LayerId, Mandrel, Tow};
use std::fmt;
use std::path::PathBuf;

/// Change notification emitted after every state transition of the store
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectEvent {
    /// Store was reset to an empty project
    Reset,
    /// A project was loaded wholesale
    Loaded {
        /// Path the project was loaded from.
        file_path: Option<PathBuf>,
    },
    /// Mandrel parameters changed
    MandrelChanged(Mandrel),
    /// Tow parameters changed
    TowChanged(Tow),
    /// Output axis convention changed
    AxisFormatChanged(AxisFormat),
    /// A layer was appended
    LayerAdded {
        /// New layer.
        id: LayerId,
        /// Its position.
        index: usize,
    },
    /// A layer was removed
    LayerRemoved {
        /// Removed layer.
        id: LayerId,
        /// Position it occupied.
        index: usize,
    },
    /// A copy of a layer was inserted after it
    LayerDuplicated {
        /// Layer that was copied.
        source: LayerId,
        /// The new copy.
        copy: LayerId,
        /// Position of the copy.
        index: usize,
    },
    /// One layer moved within the sequence
    LayersReordered {
        /// Original position.
        from: usize,
        /// New position.
        to: usize,
    },
    /// Parameters of a layer changed
    LayerUpdated {
        /// Updated layer.
        id: LayerId,
    },
    /// Selection changed
    ActiveLayerChanged(Option<LayerId>),
    /// Document path changed
    FilePathChanged(Option<PathBuf>),
    /// Dirty flag flipped
    DirtyChanged(bool),
}

impl ProjectEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            Self::Reset
            | Self::Loaded { .. }
            | Self::FilePathChanged(_)
            | Self::DirtyChanged(_) => EventCategory::Document,
            Self::MandrelChanged(_) | Self::TowChanged(_) | Self::AxisFormatChanged(_) => {
                EventCategory::Parameters
            }
            Self::LayerAdded { .. }
            | Self::LayerRemoved { .. }
            | Self::LayerDuplicated { .. }
            | Self::LayersReordered { .. }
            | Self::LayerUpdated { .. } => EventCategory::Layers,
            Self::ActiveLayerChanged(_) => EventCategory::Selection,
        }
    }
}

impl fmt::Display for ProjectEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reset => write!(f, "New project"),
            Self::Loaded { file_path } => match file_path {
                Some(path) => write!(f, "Loaded {}", path.display()),
                None => write!(f, "Loaded project"),
            },
            Self::MandrelChanged(m) => {
                write!(f, "Mandrel: {} x {} mm", m.diameter, m.wind_length)
            }
            Self::TowChanged(t) => write!(f, "Tow: {} x {} mm", t.width, t.thickness),
            Self::AxisFormatChanged(a) => write!(f, "Axis format: {}", a),
            Self::LayerAdded { id, index } => write!(f, "Layer {} added at {}", id, index),
            Self::LayerRemoved { id, index } => write!(f, "Layer {} removed from {}", id, index),
            Self::LayerDuplicated { source, copy, .. } => {
                write!(f, "Layer {} duplicated as {}", source, copy)
            }
            Self::LayersReordered { from, to } => write!(f, "Layer moved {} -> {}", from, to),
            Self::LayerUpdated { id } => write!(f, "Layer {} updated", id),
            Self::ActiveLayerChanged(Some(id)) => write!(f, "Selected layer {}", id),
            Self::ActiveLayerChanged(None) => write!(f, "Selection cleared"),
            Self::FilePathChanged(Some(path)) => write!(f, "File: {}", path.display()),
            Self::FilePathChanged(None) => write!(f, "File: untitled"),
            Self::DirtyChanged(dirty) => write!(f, "Dirty: {}", dirty),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// Whole-document lifecycle: reset, load, path, dirty flag.
    Document,
    /// Mandrel, tow and output settings.
    Parameters,
    /// Layer sequence and layer contents.
    Layers,
    /// Active layer selection.
    Selection,
}
