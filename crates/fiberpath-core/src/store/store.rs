//! Project store: the single mutable owner of the live project.
//!
//! Every operation is an atomic transition that leaves the project
//! consistent. Operations naming a layer id that no longer exists, and
//! out-of-range reorder indices, are silent no-ops: UI callbacks can
//! arrive after the layer they refer to is gone.

use super::bus::{EventBus, EventFilter, SubscriptionId};
use super::events::ProjectEvent;
use crate::project::{
    AxisFormat, Layer, LayerId, LayerPatch, LayerType, MandrelPatch, Project, TowPatch,
};
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::sync::broadcast;

/// Owner of one [`Project`] with change notification
#[derive(Debug, Default)]
pub struct ProjectStore {
    project: Project,
    bus: EventBus,
}

impl ProjectStore {
    /// Create a store holding an empty project
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store around an existing project
    pub fn with_project(project: Project) -> Self {
        let mut store = Self::default();
        store.project = sanitize(project);
        store
    }

    /// Current state
    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn is_dirty(&self) -> bool {
        self.project.is_dirty
    }

    /// Register a change handler
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&ProjectEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(filter, handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Receiver for async consumers of change events
    pub fn receiver(&self) -> broadcast::Receiver<ProjectEvent> {
        self.bus.receiver()
    }

    /// Reset to an empty, clean, unsaved project
    ///
    /// Discarding unsaved changes must be confirmed by the caller first.
    pub fn new_project(&mut self) {
        self.new_project_with(AxisFormat::default());
    }

    /// Like [`new_project`](Self::new_project), starting on `axis_format`
    pub fn new_project_with(&mut self, axis_format: AxisFormat) {
        self.project = Project {
            axis_format,
            ..Project::new()
        };
        tracing::info!(%axis_format, "New project");
        self.bus.publish(ProjectEvent::Reset);
    }

    /// Replace the whole state with a loaded project and mark it clean
    pub fn load_project(&mut self, project: Project) {
        let mut project = sanitize(project);
        project.is_dirty = false;
        let file_path = project.file_path.clone();
        tracing::info!(layers = project.layers.len(), "Project loaded");
        self.project = project;
        self.bus.publish(ProjectEvent::Loaded { file_path });
    }

    pub fn update_mandrel(&mut self, patch: MandrelPatch) {
        self.project.mandrel.apply(&patch);
        self.bus.publish(ProjectEvent::MandrelChanged(self.project.mandrel));
        self.mark_dirty();
    }

    pub fn update_tow(&mut self, patch: TowPatch) {
        self.project.tow.apply(&patch);
        self.bus.publish(ProjectEvent::TowChanged(self.project.tow));
        self.mark_dirty();
    }

    pub fn set_axis_format(&mut self, axis_format: AxisFormat) {
        if self.project.axis_format == axis_format {
            return;
        }
        self.project.axis_format = axis_format;
        self.bus.publish(ProjectEvent::AxisFormatChanged(axis_format));
        self.mark_dirty();
    }

    /// Append a layer with variant defaults; selection is left alone
    pub fn add_layer(&mut self, layer_type: LayerType) -> LayerId {
        let layer = Layer::new(layer_type);
        let id = layer.id();
        self.project.layers.push(layer);
        let index = self.project.layers.len() - 1;
        tracing::debug!(layer_id = %id, %layer_type, "Layer added");
        self.bus.publish(ProjectEvent::LayerAdded { id, index });
        self.mark_dirty();
        id
    }

    /// Remove a layer; clears the selection if it was the active one
    pub fn remove_layer(&mut self, id: LayerId) {
        let Some(index) = self.project.layer_index(id) else {
            return;
        };
        self.project.layers.remove(index);
        tracing::debug!(layer_id = %id, "Layer removed");
        self.bus.publish(ProjectEvent::LayerRemoved { id, index });

        if self.project.active_layer_id == Some(id) {
            self.project.active_layer_id = None;
            self.bus.publish(ProjectEvent::ActiveLayerChanged(None));
        }
        self.mark_dirty();
    }

    /// Insert a copy of a layer right after it; returns the copy's id
    pub fn duplicate_layer(&mut self, id: LayerId) -> Option<LayerId> {
        let index = self.project.layer_index(id)?;
        let copy = self.project.layers[index].duplicate();
        let copy_id = copy.id();
        self.project.layers.insert(index + 1, copy);
        tracing::debug!(layer_id = %id, copy_id = %copy_id, "Layer duplicated");
        self.bus.publish(ProjectEvent::LayerDuplicated {
            source: id,
            copy: copy_id,
            index: index + 1,
        });
        self.mark_dirty();
        Some(copy_id)
    }

    /// Move the layer at `from` to `to`, shifting the ones in between
    pub fn reorder_layers(&mut self, from: usize, to: usize) {
        let len = self.project.layers.len();
        if from >= len || to >= len {
            tracing::debug!(from, to, len, "Ignoring stale reorder");
            return;
        }
        if from == to {
            return;
        }
        let layer = self.project.layers.remove(from);
        self.project.layers.insert(to, layer);
        self.bus.publish(ProjectEvent::LayersReordered { from, to });
        self.mark_dirty();
    }

    /// Merge a patch into a layer of the matching variant
    pub fn update_layer(&mut self, id: LayerId, patch: &LayerPatch) {
        let Some(layer) = self.project.layers.iter_mut().find(|l| l.id() == id) else {
            return;
        };
        if !layer.apply(patch) {
            tracing::debug!(
                layer_id = %id,
                layer_type = %layer.layer_type(),
                patch_type = %patch.layer_type(),
                "Ignoring patch for a different layer type"
            );
            return;
        }
        self.bus.publish(ProjectEvent::LayerUpdated { id });
        self.mark_dirty();
    }

    /// Select a layer, or clear the selection
    ///
    /// An id that does not name a current layer is ignored.
    pub fn set_active_layer_id(&mut self, id: Option<LayerId>) {
        if let Some(id) = id {
            if self.project.layer(id).is_none() {
                return;
            }
        }
        if self.project.active_layer_id != id {
            self.project.active_layer_id = id;
            self.bus.publish(ProjectEvent::ActiveLayerChanged(id));
        }
    }

    pub fn set_file_path(&mut self, path: Option<PathBuf>) {
        if self.project.file_path != path {
            self.project.file_path = path.clone();
            self.bus.publish(ProjectEvent::FilePathChanged(path));
        }
    }

    /// Mark the project clean, after a successful save
    pub fn clear_dirty(&mut self) {
        if self.project.is_dirty {
            self.project.is_dirty = false;
            self.bus.publish(ProjectEvent::DirtyChanged(false));
        }
    }

    fn mark_dirty(&mut self) {
        if !self.project.is_dirty {
            self.project.is_dirty = true;
            self.bus.publish(ProjectEvent::DirtyChanged(true));
        }
    }
}

/// Restore the id invariants on a project built outside the store
fn sanitize(mut project: Project) -> Project {
    let mut seen = HashSet::new();
    for layer in project.layers.iter_mut() {
        if !seen.insert(layer.id()) {
            tracing::warn!(layer_id = %layer.id(), "Duplicate layer id reassigned");
            *layer = layer.duplicate();
            seen.insert(layer.id());
        }
    }
    if project.active_layer().is_none() {
        project.active_layer_id = None;
    }
    project
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{HelicalPatch, HoopPatch, LayerKind};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recorded(store: &ProjectStore) -> Arc<Mutex<Vec<ProjectEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(EventFilter::All, move |e| sink.lock().push(e.clone()));
        events
    }

    #[test]
    fn test_add_layer_marks_dirty_and_keeps_selection() {
        let mut store = ProjectStore::new();
        let first = store.add_layer(LayerType::Hoop);
        store.set_active_layer_id(Some(first));
        store.add_layer(LayerType::Helical);
        assert!(store.is_dirty());
        assert_eq!(store.project().active_layer_id, Some(first));
        assert_eq!(store.project().layers.len(), 2);
    }

    #[test]
    fn test_remove_active_layer_clears_selection() {
        let mut store = ProjectStore::new();
        let a = store.add_layer(LayerType::Hoop);
        let b = store.add_layer(LayerType::Skip);
        store.set_active_layer_id(Some(b));
        store.remove_layer(a);
        assert_eq!(store.project().active_layer_id, Some(b));
        store.remove_layer(b);
        assert_eq!(store.project().active_layer_id, None);
    }

    #[test]
    fn test_missing_ids_are_noops() {
        let mut store = ProjectStore::new();
        let ghost = LayerId::new();
        store.remove_layer(ghost);
        assert_eq!(store.duplicate_layer(ghost), None);
        store.update_layer(ghost, &HoopPatch::default().into());
        store.set_active_layer_id(Some(ghost));
        assert!(!store.is_dirty());
        assert!(store.project().active_layer_id.is_none());
    }

    #[test]
    fn test_duplicate_inserts_after_source() {
        let mut store = ProjectStore::new();
        let a = store.add_layer(LayerType::Helical);
        let b = store.add_layer(LayerType::Skip);
        let copy = store.duplicate_layer(a).unwrap();
        let ids: Vec<_> = store.project().layers.iter().map(|l| l.id()).collect();
        assert_eq!(ids, vec![a, copy, b]);
        assert_eq!(
            store.project().layers[0].kind(),
            store.project().layers[1].kind()
        );
    }

    #[test]
    fn test_reorder_out_of_bounds_is_ignored() {
        let mut store = ProjectStore::new();
        store.add_layer(LayerType::Hoop);
        store.add_layer(LayerType::Skip);
        store.clear_dirty();
        store.reorder_layers(0, 2);
        store.reorder_layers(5, 0);
        assert!(!store.is_dirty());
        store.reorder_layers(0, 1);
        assert_eq!(store.project().layers[0].layer_type(), LayerType::Skip);
        assert!(store.is_dirty());
    }

    #[test]
    fn test_update_layer_respects_variant() {
        let mut store = ProjectStore::new();
        let id = store.add_layer(LayerType::Helical);
        store.clear_dirty();

        store.update_layer(id, &HoopPatch { terminal: Some(true) }.into());
        assert!(!store.is_dirty());

        store.update_layer(
            id,
            &HelicalPatch {
                wind_angle: Some(60.0),
                ..Default::default()
            }
            .into(),
        );
        assert!(store.is_dirty());
        match store.project().layers[0].kind() {
            LayerKind::Helical(h) => assert_eq!(h.wind_angle, 60.0),
            other => panic!("expected helical, got {:?}", other),
        }
    }

    #[test]
    fn test_load_clears_dirty_and_new_resets() {
        let mut store = ProjectStore::new();
        store.add_layer(LayerType::Hoop);
        let mut loaded = Project::new();
        loaded.is_dirty = true;
        loaded.file_path = Some(PathBuf::from("a.wind"));
        store.load_project(loaded);
        assert!(!store.is_dirty());
        assert!(store.project().layers.is_empty());

        store.update_mandrel(MandrelPatch {
            diameter: Some(80.0),
            ..Default::default()
        });
        assert!(store.is_dirty());
        store.new_project();
        assert!(!store.is_dirty());
        assert!(store.project().file_path.is_none());
        assert_eq!(store.project().mandrel.diameter, 100.0);

        store.new_project_with(AxisFormat::Xyz);
        assert!(!store.is_dirty());
        assert_eq!(store.project().axis_format, AxisFormat::Xyz);
    }

    #[test]
    fn test_bookkeeping_does_not_dirty() {
        let mut store = ProjectStore::new();
        let id = store.add_layer(LayerType::Hoop);
        store.clear_dirty();
        store.set_active_layer_id(Some(id));
        store.set_file_path(Some(PathBuf::from("x.wind")));
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_events_are_published() {
        let mut store = ProjectStore::new();
        let events = recorded(&store);
        let id = store.add_layer(LayerType::Hoop);
        store.set_active_layer_id(Some(id));
        store.remove_layer(id);

        let events = events.lock();
        assert_eq!(
            *events,
            vec![
                ProjectEvent::LayerAdded { id, index: 0 },
                ProjectEvent::DirtyChanged(true),
                ProjectEvent::ActiveLayerChanged(Some(id)),
                ProjectEvent::LayerRemoved { id, index: 0 },
                ProjectEvent::ActiveLayerChanged(None),
            ]
        );
    }

    #[test]
    fn test_independent_stores_do_not_share_events() {
        let mut a = ProjectStore::new();
        let b = ProjectStore::new();
        let seen_by_b = recorded(&b);
        a.add_layer(LayerType::Skip);
        assert!(seen_by_b.lock().is_empty());
    }

    #[test]
    fn test_with_project_repairs_dangling_selection() {
        let mut project = Project::new();
        project.active_layer_id = Some(LayerId::new());
        let store = ProjectStore::with_project(project);
        assert!(store.project().active_layer_id.is_none());
    }
}
