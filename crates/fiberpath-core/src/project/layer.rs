//! Layer variant set
//!
//! A layer is exactly one of three winding passes. Each variant carries its
//! own parameter record; patches are scoped to a single variant and are
//! ignored when applied to a layer of a different kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable identity of a layer inside one project
///
/// Assigned on creation and never changed. Other state refers to a layer by
/// this value and looks it up again on every use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    /// Create a new unique layer id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Layer variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    /// Circumferential pass at roughly 90 degrees to the mandrel axis
    Hoop,
    /// Angled pass following a repeating pattern
    Helical,
    /// Pure mandrel rotation, no material laid down
    Skip,
}

impl LayerType {
    /// All variant tags in display order
    pub const ALL: [LayerType; 3] = [LayerType::Hoop, LayerType::Helical, LayerType::Skip];

    /// Wire and display name of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hoop => "hoop",
            Self::Helical => "helical",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hoop" => Ok(Self::Hoop),
            "helical" => Ok(Self::Helical),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown layer type '{}'", other)),
        }
    }
}

/// Hoop pass parameters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HoopLayer {
    /// Marks the pass as first or last in the definition
    pub terminal: bool,
}

/// Helical pass parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HelicalLayer {
    /// Wind angle in degrees, strictly between 0 and 90
    pub wind_angle: f64,
    /// Number of pattern repeats around the mandrel
    pub pattern_number: u32,
    /// Circuit skip index, coprime with `pattern_number`
    pub skip_index: u32,
    /// Dwell rotation at each end in degrees
    pub lock_degrees: f64,
    /// Lead-in length in mm
    pub lead_in_mm: f64,
    /// Lead-out rotation in degrees
    pub lead_out_degrees: f64,
    /// Skip the first circuit near the lock position; `None` when a loaded
    /// file left it unset, which the planner reads as `false`
    pub skip_initial_near_lock: Option<bool>,
}

impl Default for HelicalLayer {
    fn default() -> Self {
        Self {
            wind_angle: 45.0,
            pattern_number: 3,
            skip_index: 2,
            lock_degrees: 5.0,
            lead_in_mm: 10.0,
            lead_out_degrees: 5.0,
            skip_initial_near_lock: Some(false),
        }
    }
}

impl HelicalLayer {
    pub fn skips_initial_near_lock(&self) -> bool {
        self.skip_initial_near_lock.unwrap_or(false)
    }
}

/// Skip pass parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkipLayer {
    /// Mandrel rotation in degrees, sign permitted
    pub mandrel_rotation: f64,
}

impl Default for SkipLayer {
    fn default() -> Self {
        Self {
            mandrel_rotation: 90.0,
        }
    }
}

/// Variant payload of a layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    /// Hoop pass
    Hoop(HoopLayer),
    /// Helical pass
    Helical(HelicalLayer),
    /// Skip pass
    Skip(SkipLayer),
}

impl LayerKind {
    /// Default parameters for a variant tag
    pub fn defaults(layer_type: LayerType) -> Self {
        match layer_type {
            LayerType::Hoop => Self::Hoop(HoopLayer::default()),
            LayerType::Helical => Self::Helical(HelicalLayer::default()),
            LayerType::Skip => Self::Skip(SkipLayer::default()),
        }
    }

    /// Variant tag of this payload
    pub fn layer_type(&self) -> LayerType {
        match self {
            Self::Hoop(_) => LayerType::Hoop,
            Self::Helical(_) => LayerType::Helical,
            Self::Skip(_) => LayerType::Skip,
        }
    }

    /// Merge a patch into this payload
    ///
    /// Returns `false` without touching anything when the patch targets a
    /// different variant.
    pub fn apply(&mut self, patch: &LayerPatch) -> bool {
        match (self, patch) {
            (Self::Hoop(layer), LayerPatch::Hoop(p)) => {
                p.apply_to(layer);
                true
            }
            (Self::Helical(layer), LayerPatch::Helical(p)) => {
                p.apply_to(layer);
                true
            }
            (Self::Skip(layer), LayerPatch::Skip(p)) => {
                p.apply_to(layer);
                true
            }
            _ => false,
        }
    }

    /// One-line human readable summary, as shown in a layer list
    pub fn summary(&self) -> String {
        match self {
            Self::Hoop(h) if h.terminal => "Hoop (terminal)".to_string(),
            Self::Hoop(_) => "Hoop".to_string(),
            Self::Helical(h) => format!(
                "Helical {}° pattern {} skip {}",
                h.wind_angle, h.pattern_number, h.skip_index
            ),
            Self::Skip(s) => format!("Skip {}°", s.mandrel_rotation),
        }
    }
}

/// One entry of the winding sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    id: LayerId,
    kind: LayerKind,
}

impl Layer {
    /// Create a layer with variant defaults and a fresh id
    pub fn new(layer_type: LayerType) -> Self {
        Self::with_kind(LayerKind::defaults(layer_type))
    }

    /// Create a layer with the given payload and a fresh id
    pub fn with_kind(kind: LayerKind) -> Self {
        Self {
            id: LayerId::new(),
            kind,
        }
    }

    /// Copy of this layer under a new id
    pub fn duplicate(&self) -> Self {
        Self::with_kind(self.kind)
    }

    /// Layer id
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Variant payload
    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }

    /// Variant tag
    pub fn layer_type(&self) -> LayerType {
        self.kind.layer_type()
    }

    /// Merge a variant-scoped patch; see [`LayerKind::apply`]
    pub fn apply(&mut self, patch: &LayerPatch) -> bool {
        self.kind.apply(patch)
    }
}

/// Partial update of a hoop layer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HoopPatch {
    pub terminal: Option<bool>,
}

impl HoopPatch {
    fn apply_to(&self, layer: &mut HoopLayer) {
        if let Some(terminal) = self.terminal {
            layer.terminal = terminal;
        }
    }
}

/// Partial update of a helical layer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HelicalPatch {
    pub wind_angle: Option<f64>,
    pub pattern_number: Option<u32>,
    pub skip_index: Option<u32>,
    pub lock_degrees: Option<f64>,
    pub lead_in_mm: Option<f64>,
    pub lead_out_degrees: Option<f64>,
    pub skip_initial_near_lock: Option<bool>,
}

impl HelicalPatch {
    fn apply_to(&self, layer: &mut HelicalLayer) {
        if let Some(v) = self.wind_angle {
            layer.wind_angle = v;
        }
        if let Some(v) = self.pattern_number {
            layer.pattern_number = v;
        }
        if let Some(v) = self.skip_index {
            layer.skip_index = v;
        }
        if let Some(v) = self.lock_degrees {
            layer.lock_degrees = v;
        }
        if let Some(v) = self.lead_in_mm {
            layer.lead_in_mm = v;
        }
        if let Some(v) = self.lead_out_degrees {
            layer.lead_out_degrees = v;
        }
        if let Some(v) = self.skip_initial_near_lock {
            layer.skip_initial_near_lock = Some(v);
        }
    }
}

/// Partial update of a skip layer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SkipPatch {
    pub mandrel_rotation: Option<f64>,
}

impl SkipPatch {
    fn apply_to(&self, layer: &mut SkipLayer) {
        if let Some(v) = self.mandrel_rotation {
            layer.mandrel_rotation = v;
        }
    }
}

/// Variant-scoped partial update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerPatch {
    Hoop(HoopPatch),
    Helical(HelicalPatch),
    Skip(SkipPatch),
}

impl LayerPatch {
    /// Variant this patch applies to
    pub fn layer_type(&self) -> LayerType {
        match self {
            Self::Hoop(_) => LayerType::Hoop,
            Self::Helical(_) => LayerType::Helical,
            Self::Skip(_) => LayerType::Skip,
        }
    }
}

impl From<HoopPatch> for LayerPatch {
    fn from(patch: HoopPatch) -> Self {
        Self::Hoop(patch)
    }
}

impl From<HelicalPatch> for LayerPatch {
    fn from(patch: HelicalPatch) -> Self {
        Self::Helical(patch)
    }
}

impl From<SkipPatch> for LayerPatch {
    fn from(patch: SkipPatch) -> Self {
        Self::Skip(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_defaults() {
        let hoop = Layer::new(LayerType::Hoop);
        assert_eq!(hoop.kind(), &LayerKind::Hoop(HoopLayer { terminal: false }));

        let helical = Layer::new(LayerType::Helical);
        match helical.kind() {
            LayerKind::Helical(h) => {
                assert_eq!(h.wind_angle, 45.0);
                assert_eq!(h.pattern_number, 3);
                assert_eq!(h.skip_index, 2);
                assert_eq!(h.skip_initial_near_lock, Some(false));
            }
            other => panic!("expected helical, got {:?}", other),
        }

        let skip = Layer::new(LayerType::Skip);
        assert_eq!(
            skip.kind(),
            &LayerKind::Skip(SkipLayer {
                mandrel_rotation: 90.0
            })
        );
    }

    #[test]
    fn test_fresh_ids_are_distinct() {
        let a = Layer::new(LayerType::Hoop);
        let b = Layer::new(LayerType::Hoop);
        assert_ne!(a.id(), b.id());
        assert_ne!(a.duplicate().id(), a.id());
    }

    #[test]
    fn test_duplicate_keeps_values() {
        let mut layer = Layer::new(LayerType::Helical);
        layer.apply(&HelicalPatch {
            wind_angle: Some(30.0),
            ..Default::default()
        }
        .into());
        let copy = layer.duplicate();
        assert_eq!(copy.kind(), layer.kind());
    }

    #[test]
    fn test_patch_merges_only_given_fields() {
        let mut layer = Layer::new(LayerType::Helical);
        let applied = layer.apply(&LayerPatch::Helical(HelicalPatch {
            pattern_number: Some(5),
            skip_initial_near_lock: Some(true),
            ..Default::default()
        }));
        assert!(applied);
        match layer.kind() {
            LayerKind::Helical(h) => {
                assert_eq!(h.pattern_number, 5);
                assert_eq!(h.skip_index, 2);
                assert_eq!(h.skip_initial_near_lock, Some(true));
            }
            other => panic!("expected helical, got {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_patch_is_ignored() {
        let mut layer = Layer::new(LayerType::Skip);
        let before = *layer.kind();
        let applied = layer.apply(&LayerPatch::Hoop(HoopPatch {
            terminal: Some(true),
        }));
        assert!(!applied);
        assert_eq!(layer.kind(), &before);
    }

    #[test]
    fn test_layer_type_parse() {
        assert_eq!("helical".parse::<LayerType>(), Ok(LayerType::Helical));
        assert!("polar".parse::<LayerType>().is_err());
        assert_eq!(LayerType::Skip.to_string(), "skip");
    }

    #[test]
    fn test_layer_id_round_trips_through_string() {
        let id = LayerId::new();
        let parsed: LayerId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
