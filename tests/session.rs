use async_trait::async_trait;
use fiberpath_communication::{CliOutput, CliRunner, FiberpathGateway, GatewayOptions};
use fiberpath_core::project::{HelicalField, MandrelField};
use fiberpath_core::{AxisFormat, CommandError, Error, LayerKind, LayerType};
use fiberpath_settings::RecentFiles;
use fiberpath_studio::{ExportOutcome, ProjectSession, SaveOutcome};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::Path;

#[derive(Default)]
struct MockRunner {
    calls: Mutex<Vec<Vec<String>>>,
    responses: Mutex<VecDeque<CliOutput>>,
}

impl MockRunner {
    fn replying(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|s| CliOutput::ok(*s)).collect()),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CliRunner for MockRunner {
    async fn run(&self, args: &[String]) -> Result<CliOutput, CommandError> {
        self.calls.lock().push(args.to_vec());
        if let Some(i) = args.iter().position(|a| a == "--output") {
            if args[0].starts_with("plot") {
                std::fs::write(&args[i + 1], b"\x89PNG\r\n").unwrap();
            }
        }
        Ok(self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| CliOutput::ok("{}")))
    }
}

fn session(runner: MockRunner, dir: &Path) -> ProjectSession<MockRunner> {
    let gateway = FiberpathGateway::with_options(
        runner,
        GatewayOptions {
            temp_dir: dir.to_path_buf(),
            ..Default::default()
        },
    );
    ProjectSession::new(gateway, RecentFiles::new(5))
}

fn keep_changes(_: &str) -> bool {
    false
}

fn discard_changes(_: &str) -> bool {
    true
}

#[tokio::test]
async fn save_then_open_restores_the_project() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vessel.wind");

    let mut first = session(MockRunner::default(), dir.path());
    assert_eq!(first.save().await.unwrap(), SaveOutcome::NeedsPath);

    first.store_mut().add_layer(LayerType::Hoop);
    first.store_mut().add_layer(LayerType::Helical);
    assert!(first.edit_mandrel(MandrelField::Diameter, "150"));
    assert!(first.store().is_dirty());
    assert_eq!(first.title(), "FiberPath Studio - Untitled*");

    first.save_as(&path).await.unwrap();
    assert!(!first.store().is_dirty());
    assert_eq!(first.title(), "FiberPath Studio - vessel.wind");
    assert_eq!(first.recent_files().get(0).unwrap().path, path);
    assert_eq!(first.save().await.unwrap(), SaveOutcome::Saved(path.clone()));

    let mut second = session(MockRunner::default(), dir.path());
    assert!(second.open(&path, &mut discard_changes).await.unwrap());

    let loaded = second.store().project();
    assert_eq!(loaded.file_path.as_deref(), Some(path.as_path()));
    assert_eq!(loaded.mandrel.diameter, 150.0);
    assert!(!loaded.is_dirty);
    let kinds: Vec<LayerKind> = loaded.layers.iter().map(|l| *l.kind()).collect();
    let expected: Vec<LayerKind> = first
        .store()
        .project()
        .layers
        .iter()
        .map(|l| *l.kind())
        .collect();
    assert_eq!(kinds, expected);
    assert!(second.gateway().runner().calls().is_empty());
}

#[tokio::test]
async fn declined_prompt_keeps_unsaved_work() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("other.wind");
    std::fs::write(&path, "{}").unwrap();

    let mut session = session(MockRunner::default(), dir.path());
    session.store_mut().add_layer(LayerType::Skip);

    assert!(!session.open(&path, &mut keep_changes).await.unwrap());
    assert!(!session.new_project(&mut keep_changes));
    assert_eq!(session.store().project().layers.len(), 1);
    assert!(session.store().is_dirty());

    let mut asked = Vec::new();
    assert!(session.new_project(&mut |action: &str| {
        asked.push(action.to_string());
        true
    }));
    assert_eq!(asked, vec!["New project".to_string()]);
    assert!(session.store().project().layers.is_empty());
    assert!(!session.store().is_dirty());
}

#[tokio::test]
async fn clean_project_opens_without_asking() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.wind");
    let mut writer = session(MockRunner::default(), dir.path());
    writer.save_as(&path).await.unwrap();

    let mut reader = session(MockRunner::default(), dir.path());
    let mut never = |_: &str| -> bool { panic!("prompted for a clean project") };
    assert!(reader.open(&path, &mut never).await.unwrap());
}

#[tokio::test]
async fn broken_file_leaves_current_project_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.wind");
    std::fs::write(
        &path,
        r#"{
            "mandrelParameters": {"diameter": 100, "windLength": 200},
            "towParameters": {"width": 3, "thickness": 0.25},
            "defaultFeedRate": 2000,
            "layers": [{"windType": "polar"}]
        }"#,
    )
    .unwrap();

    let mut session = session(MockRunner::default(), dir.path());
    let id = session.store_mut().add_layer(LayerType::Hoop);

    let err = session
        .open(&path, &mut discard_changes)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::WindFile(_)));
    assert_eq!(session.store().project().layers[0].id(), id);
    assert!(session.store().is_dirty());
    assert!(session.recent_files().is_empty());

    let missing = dir.path().join("missing.wind");
    let err = session
        .open(&missing, &mut discard_changes)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Command(CommandError::File { .. })));
}

#[tokio::test]
async fn open_recent_uses_list_order() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.wind");
    let b = dir.path().join("b.wind");

    let mut session = session(MockRunner::default(), dir.path());
    session.save_as(&a).await.unwrap();
    session.save_as(&b).await.unwrap();

    assert!(session.open_recent(1, &mut discard_changes).await.unwrap());
    assert_eq!(session.store().project().file_path.as_deref(), Some(a.as_path()));
    assert_eq!(session.recent_files().get(0).unwrap().path, a);
    assert!(!session.open_recent(9, &mut discard_changes).await.unwrap());
}

#[tokio::test]
async fn rejected_export_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let runner = MockRunner::replying(&[
        r#"{"valid": false, "errors": [{"field": "layers[0]", "message": "bad angle"}]}"#,
    ]);
    let mut session = session(runner, dir.path());
    session.store_mut().add_layer(LayerType::Helical);

    let gcode = dir.path().join("out.gcode");
    let outcome = session.export_gcode(&gcode).await.unwrap();

    let ExportOutcome::Invalid(report) = outcome else {
        panic!("expected a rejected export");
    };
    assert_eq!(report.errors.len(), 1);
    assert!(!gcode.with_extension("wind").exists());
    let calls = session.gateway().runner().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][0], "validate");
}

#[tokio::test]
async fn export_writes_wind_and_plans_with_axis_format() {
    let dir = tempfile::tempdir().unwrap();
    let runner = MockRunner::replying(&[r#"{"valid": true}"#, r#"{"commands": 240}"#]);
    let mut session = session(runner, dir.path());
    session.store_mut().add_layer(LayerType::Hoop);
    session.store_mut().set_axis_format(AxisFormat::Xyz);

    let gcode = dir.path().join("job.gcode");
    let ExportOutcome::Exported { wind_path, plan } = session.export_gcode(&gcode).await.unwrap()
    else {
        panic!("expected an export");
    };

    assert_eq!(wind_path, dir.path().join("job.wind"));
    assert!(wind_path.exists());
    assert_eq!(plan.commands, 240);
    assert_eq!(plan.output, gcode.to_string_lossy());

    let calls = session.gateway().runner().calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1],
        vec![
            "plan".to_string(),
            wind_path.to_string_lossy().into_owned(),
            "--output".to_string(),
            gcode.to_string_lossy().into_owned(),
            "--json".to_string(),
            "--axis-format".to_string(),
            "xyz".to_string(),
        ]
    );
}

#[tokio::test]
async fn preview_clamps_visible_layers() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(MockRunner::default(), dir.path());
    session.store_mut().add_layer(LayerType::Hoop);
    session.store_mut().add_layer(LayerType::Skip);

    let preview = session.preview(Some(5)).await.unwrap();
    assert!(!preview.image_base64.is_empty());

    session.preview(Some(1)).await.unwrap();
    session.preview(None).await.unwrap();

    let layers: Vec<String> = session
        .gateway()
        .runner()
        .calls()
        .iter()
        .map(|args| {
            assert_eq!(args[0], "plot-definition");
            let i = args.iter().position(|a| a == "--layers").unwrap();
            args[i + 1].clone()
        })
        .collect();
    assert_eq!(layers, vec!["2", "1", "2"]);
}

#[tokio::test]
async fn rejected_edits_leave_the_store_alone() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(MockRunner::default(), dir.path());

    assert!(!session.edit_mandrel(MandrelField::WindLength, "-4"));
    assert!(session.field_errors().get("mandrel.windLength").is_some());
    assert_eq!(session.store().project().mandrel.wind_length, 200.0);
    assert!(!session.store().is_dirty());

    assert!(session.edit_mandrel(MandrelField::WindLength, "250"));
    assert!(session.field_errors().is_empty());
    assert_eq!(session.store().project().mandrel.wind_length, 250.0);

    let helical = session.store_mut().add_layer(LayerType::Helical);
    let hoop = session.store_mut().add_layer(LayerType::Hoop);

    // 3 and 6 share a factor
    assert!(!session.edit_helical(helical, HelicalField::SkipIndex, "6"));
    assert_eq!(session.field_errors().len(), 1);
    assert!(session.edit_helical(helical, HelicalField::SkipIndex, "4"));
    assert!(session.field_errors().is_empty());
    match session.store().project().layer(helical).unwrap().kind() {
        LayerKind::Helical(h) => assert_eq!(h.skip_index, 4),
        other => panic!("unexpected layer {:?}", other),
    }

    assert!(!session.edit_helical(hoop, HelicalField::WindAngle, "30"));
    assert!(!session.edit_skip_rotation(hoop, "45"));
}

#[tokio::test]
async fn active_layer_actions_need_a_selection() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(MockRunner::default(), dir.path());
    let id = session.store_mut().add_layer(LayerType::Skip);

    assert!(!session.duplicate_active_layer());
    assert!(!session.delete_active_layer());

    session.store_mut().set_active_layer_id(Some(id));
    assert!(session.edit_skip_rotation(id, "-45"));
    assert!(session.duplicate_active_layer());
    assert_eq!(session.store().project().layers.len(), 2);

    assert!(!session.edit_skip_rotation(id, "abc"));
    assert!(session.delete_active_layer());
    assert!(session.field_errors().is_empty());
    assert_eq!(session.store().project().layers.len(), 1);
    assert_eq!(session.store().project().active_layer_id, None);
    match session.store().project().layers[0].kind() {
        LayerKind::Skip(s) => assert_eq!(s.mandrel_rotation, -45.0),
        other => panic!("unexpected layer {:?}", other),
    }
}

#[tokio::test]
async fn configured_axis_format_survives_new_and_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("xyz.wind");
    let runner = MockRunner::replying(&[r#"{"valid": true}"#, r#"{"commands": 12}"#]);
    let mut session = session(runner, dir.path()).with_default_axis_format(AxisFormat::Xyz);
    assert_eq!(session.store().project().axis_format, AxisFormat::Xyz);
    assert!(!session.store().is_dirty());

    session.store_mut().set_axis_format(AxisFormat::Xab);
    assert!(session.new_project(&mut discard_changes));
    assert_eq!(session.store().project().axis_format, AxisFormat::Xyz);
    assert!(!session.store().is_dirty());

    session.save_as(&path).await.unwrap();
    session.store_mut().set_axis_format(AxisFormat::Xab);
    assert!(session.open(&path, &mut discard_changes).await.unwrap());
    assert_eq!(session.store().project().axis_format, AxisFormat::Xyz);
    assert!(!session.store().is_dirty());

    session.store_mut().add_layer(LayerType::Hoop);
    let gcode = dir.path().join("xyz.gcode");
    session.export_gcode(&gcode).await.unwrap();
    let calls = session.gateway().runner().calls();
    assert_eq!(calls[1].last().map(String::as_str), Some("xyz"));
}

#[tokio::test]
async fn export_refuses_a_wind_destination() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(MockRunner::default(), dir.path());
    session.store_mut().add_layer(LayerType::Hoop);

    let target = dir.path().join("job.wind");
    let err = session.export_gcode(&target).await.unwrap_err();
    assert!(matches!(err, Error::Command(CommandError::File { .. })));
    assert!(!target.exists());
    assert!(session.gateway().runner().calls().is_empty());
}
