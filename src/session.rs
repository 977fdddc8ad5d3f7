//! Project session: the project store wired to the command gateway and the
//! recent-files list.
//!
//! This is what menus and panels call. Anything that would discard an
//! unsaved project asks a [`DiscardPrompt`] first.

use fiberpath_communication::{
    CliRunner, FiberpathGateway, PlanSummary, PlotPreview, SimulationSummary, StreamSummary,
    ValidationReport,
};
use fiberpath_core::project::validation::{
    layer_key, parse_helical_input, parse_mandrel_input, parse_skip_input, parse_tow_input,
    validate_project,
};
use fiberpath_core::project::{HelicalField, MandrelField, TowField};
use fiberpath_core::{
    load_project_from_str, project_to_wind_definition, AxisFormat, CommandError, FieldErrors,
    LayerId, LayerKind, LayerPatch, ProjectStore, Result,
};
use fiberpath_settings::RecentFiles;
use std::path::{Path, PathBuf};

/// Asks the user whether unsaved changes may be thrown away
pub trait DiscardPrompt {
    /// `action` names what is about to happen, e.g. "Open file"
    fn confirm_discard(&mut self, action: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> DiscardPrompt for F {
    fn confirm_discard(&mut self, action: &str) -> bool {
        self(action)
    }
}

/// Outcome of [`ProjectSession::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    /// The project was never saved; ask for a path and call `save_as`
    NeedsPath,
}

/// Outcome of [`ProjectSession::export_gcode`]
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Exported {
        wind_path: PathBuf,
        plan: PlanSummary,
    },
    /// The validator rejected the definition; nothing was written
    Invalid(ValidationReport),
}

pub struct ProjectSession<R: CliRunner> {
    store: ProjectStore,
    gateway: FiberpathGateway<R>,
    recent: RecentFiles,
    field_errors: FieldErrors,
    default_axis_format: AxisFormat,
}

impl<R: CliRunner> ProjectSession<R> {
    pub fn new(gateway: FiberpathGateway<R>, recent: RecentFiles) -> Self {
        Self {
            store: ProjectStore::new(),
            gateway,
            recent,
            field_errors: FieldErrors::new(),
            default_axis_format: AxisFormat::default(),
        }
    }

    /// Axis format for new projects and for opened files, which do not
    /// record one
    pub fn with_default_axis_format(mut self, axis_format: AxisFormat) -> Self {
        self.default_axis_format = axis_format;
        self.store.new_project_with(axis_format);
        self
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProjectStore {
        &mut self.store
    }

    pub fn gateway(&self) -> &FiberpathGateway<R> {
        &self.gateway
    }

    pub fn recent_files(&self) -> &RecentFiles {
        &self.recent
    }

    /// Inline errors from the field editors
    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    /// Window title text
    pub fn title(&self) -> String {
        format!("FiberPath Studio - {}", self.store.project().display_name())
    }

    fn may_discard(&self, prompt: &mut impl DiscardPrompt, action: &str) -> bool {
        !self.store.is_dirty() || prompt.confirm_discard(action)
    }

    /// Start an empty project; `false` if the user kept their changes
    pub fn new_project(&mut self, prompt: &mut impl DiscardPrompt) -> bool {
        if !self.may_discard(prompt, "New project") {
            return false;
        }
        self.store.new_project_with(self.default_axis_format);
        self.field_errors = FieldErrors::new();
        true
    }

    /// Open a `.wind` file; `Ok(false)` if the user kept their changes
    ///
    /// A file that fails to parse leaves the current project untouched.
    pub async fn open(&mut self, path: &Path, prompt: &mut impl DiscardPrompt) -> Result<bool> {
        if !self.may_discard(prompt, "Open file") {
            return Ok(false);
        }
        self.load(path).await?;
        Ok(true)
    }

    /// Open the `index`-th recent file; `Ok(false)` if declined or out of range
    pub async fn open_recent(
        &mut self,
        index: usize,
        prompt: &mut impl DiscardPrompt,
    ) -> Result<bool> {
        let Some(path) = self.recent.get(index).map(|e| e.path.clone()) else {
            return Ok(false);
        };
        if !self.may_discard(prompt, "Open recent file") {
            return Ok(false);
        }
        self.load(&path).await?;
        Ok(true)
    }

    async fn load(&mut self, path: &Path) -> Result<()> {
        let content = self.gateway.load_wind_file(path).await?;
        let mut project = load_project_from_str(&content, path).map_err(|e| {
            tracing::error!("Failed to open {}: {}", path.display(), e);
            e
        })?;
        project.axis_format = self.default_axis_format;

        self.store.load_project(project);
        self.store.set_file_path(Some(path.to_path_buf()));
        self.field_errors = FieldErrors::new();
        self.remember(path);
        tracing::info!("Opened {}", path.display());
        Ok(())
    }

    /// Save to the current path
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        match self.store.project().file_path.clone() {
            Some(path) => {
                self.save_as(&path).await?;
                Ok(SaveOutcome::Saved(path))
            }
            None => Ok(SaveOutcome::NeedsPath),
        }
    }

    /// Write the project to `path` and make it the current document
    pub async fn save_as(&mut self, path: &Path) -> Result<()> {
        let content = project_to_wind_definition(self.store.project(), None).to_json_pretty()?;
        self.gateway.save_wind_file(path, &content).await?;

        self.store.set_file_path(Some(path.to_path_buf()));
        self.store.clear_dirty();
        self.remember(path);
        Ok(())
    }

    fn remember(&mut self, path: &Path) {
        if let Err(e) = self.recent.add(path) {
            tracing::warn!("Could not update recent files: {}", e);
        }
    }

    /// Run the whole project through the external validator
    pub async fn validate(&self) -> Result<ValidationReport> {
        let json = project_to_wind_definition(self.store.project(), None).to_json()?;
        let report = self.gateway.validate_wind_definition(&json).await?;
        if report.valid {
            tracing::info!("Definition is valid");
        } else {
            tracing::warn!("Validation failed:\n{}", report.describe());
        }
        Ok(report)
    }

    /// Validate, write the `.wind` next to `gcode_path`, then plan into it
    ///
    /// A `gcode_path` ending in `.wind` is refused, since the definition
    /// would be overwritten by the planner's output.
    pub async fn export_gcode(&self, gcode_path: &Path) -> Result<ExportOutcome> {
        let wind_path = gcode_path.with_extension("wind");
        if wind_path == gcode_path {
            return Err(CommandError::file(format!(
                "{} would overwrite its own .wind definition",
                gcode_path.display()
            ))
            .into());
        }

        let definition = project_to_wind_definition(self.store.project(), None);

        let report = self
            .gateway
            .validate_wind_definition(&definition.to_json()?)
            .await?;
        if !report.valid {
            tracing::warn!("Export refused:\n{}", report.describe());
            return Ok(ExportOutcome::Invalid(report));
        }

        self.gateway
            .save_wind_file(&wind_path, &definition.to_json_pretty()?)
            .await?;
        let plan = self
            .gateway
            .plan_wind(
                &wind_path,
                Some(gcode_path),
                Some(self.store.project().axis_format),
            )
            .await?;
        tracing::info!("G-code exported to {}", gcode_path.display());
        Ok(ExportOutcome::Exported { wind_path, plan })
    }

    /// Render the first `visible_layer_count` layers, or all of them
    pub async fn preview(&self, visible_layer_count: Option<usize>) -> Result<PlotPreview> {
        let project = self.store.project();
        let count = visible_layer_count
            .unwrap_or(project.layers.len())
            .min(project.layers.len());
        let json = project_to_wind_definition(project, Some(count)).to_json()?;
        Ok(self.gateway.plot_definition(&json, count, None).await?)
    }

    pub async fn simulate(&self, gcode_path: &Path) -> Result<SimulationSummary> {
        Ok(self.gateway.simulate_program(gcode_path).await?)
    }

    pub async fn stream(
        &self,
        gcode_path: &Path,
        port: Option<&str>,
        baud_rate: u32,
        dry_run: bool,
    ) -> Result<StreamSummary> {
        Ok(self
            .gateway
            .stream_program(gcode_path, port, baud_rate, dry_run)
            .await?)
    }

    /// Duplicate the selected layer; `false` when nothing is selected
    pub fn duplicate_active_layer(&mut self) -> bool {
        match self.store.project().active_layer().map(|l| l.id()) {
            Some(id) => self.store.duplicate_layer(id).is_some(),
            None => false,
        }
    }

    /// Delete the selected layer; `false` when nothing is selected
    pub fn delete_active_layer(&mut self) -> bool {
        match self.store.project().active_layer().map(|l| l.id()) {
            Some(id) => {
                self.store.remove_layer(id);
                self.field_errors.clear_prefix(&format!("layers.{}.", id));
                true
            }
            None => false,
        }
    }

    /// Apply raw text to a mandrel field; `false` if it was rejected
    pub fn edit_mandrel(&mut self, field: MandrelField, raw: &str) -> bool {
        let result = parse_mandrel_input(field, raw);
        self.field_errors.record(field.key(), &result);
        match result {
            Ok(patch) => {
                self.store.update_mandrel(patch);
                true
            }
            Err(_) => false,
        }
    }

    /// Apply raw text to a tow field; `false` if it was rejected
    pub fn edit_tow(&mut self, field: TowField, raw: &str) -> bool {
        let result = parse_tow_input(field, raw);
        self.field_errors.record(field.key(), &result);
        match result {
            Ok(patch) => {
                self.store.update_tow(patch);
                true
            }
            Err(_) => false,
        }
    }

    /// Apply raw text to a helical layer field; `false` if it was rejected
    /// or the layer is not a helical layer
    pub fn edit_helical(&mut self, id: LayerId, field: HelicalField, raw: &str) -> bool {
        let current = match self.store.project().layer(id).map(|l| *l.kind()) {
            Some(LayerKind::Helical(h)) => h,
            _ => return false,
        };
        let result = parse_helical_input(field, raw, &current);
        self.field_errors.record(&layer_key(id, field.name()), &result);
        match result {
            Ok(patch) => {
                // A fixed pattern/skip pair clears the error left on the other half.
                if matches!(field, HelicalField::PatternNumber | HelicalField::SkipIndex) {
                    self.field_errors
                        .clear(&layer_key(id, HelicalField::PatternNumber.name()));
                    self.field_errors
                        .clear(&layer_key(id, HelicalField::SkipIndex.name()));
                }
                self.store.update_layer(id, &LayerPatch::Helical(patch));
                true
            }
            Err(_) => false,
        }
    }

    /// Apply raw text to a skip layer's rotation; `false` if it was rejected
    /// or the layer is not a skip layer
    pub fn edit_skip_rotation(&mut self, id: LayerId, raw: &str) -> bool {
        if !matches!(
            self.store.project().layer(id).map(|l| l.kind()),
            Some(LayerKind::Skip(_))
        ) {
            return false;
        }
        let result = parse_skip_input(raw);
        self.field_errors
            .record(&layer_key(id, "mandrelRotation"), &result);
        match result {
            Ok(patch) => {
                self.store.update_layer(id, &LayerPatch::Skip(patch));
                true
            }
            Err(_) => false,
        }
    }

    /// Re-check every field of the current project
    pub fn check_fields(&mut self) -> &FieldErrors {
        self.field_errors = validate_project(self.store.project());
        &self.field_errors
    }
}
