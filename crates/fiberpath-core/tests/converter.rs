use fiberpath_core::wind::{MandrelParameters, TowParameters, WireHelical, WireHoop, WireSkip};
use fiberpath_core::{
    load_project_from_str, project_to_wind_definition, wind_definition_to_project, LayerType,
    ProjectStore, WindDefinition, WindFileError, WindLayer, DEFAULT_FEED_RATE,
};
use proptest::prelude::*;

const DOCUMENT: &str = r#"{
  "mandrelParameters": { "diameter": 150.0, "windLength": 800.0 },
  "towParameters": { "width": 6.35, "thickness": 0.5 },
  "defaultFeedRate": 2000.0,
  "layers": [
    { "windType": "hoop", "terminal": false },
    {
      "windType": "helical",
      "windAngle": 55.0,
      "patternNumber": 5,
      "skipIndex": 3,
      "lockDegrees": 180.0,
      "leadInMM": 25.0,
      "leadOutDegrees": 60.0,
      "skipInitialNearLock": true
    },
    { "windType": "skip", "mandrelRotation": 45.0 },
    { "windType": "hoop", "terminal": true }
  ]
}"#;

fn wire_layer() -> impl Strategy<Value = WindLayer> {
    prop_oneof![
        any::<bool>().prop_map(|terminal| WindLayer::Hoop(WireHoop { terminal })),
        (
            1.0f64..89.0,
            1u32..20,
            1u32..20,
            0.0f64..360.0,
            0.0f64..100.0,
            0.0f64..360.0,
            proptest::option::of(any::<bool>()),
        )
            .prop_map(|(angle, pattern, skip, lock, lead_in, lead_out, near)| {
                WindLayer::Helical(WireHelical {
                    wind_angle: angle,
                    pattern_number: pattern,
                    skip_index: skip,
                    lock_degrees: lock,
                    lead_in_mm: lead_in,
                    lead_out_degrees: lead_out,
                    skip_initial_near_lock: near,
                })
            }),
        (-720.0f64..720.0).prop_map(|r| WindLayer::Skip(WireSkip { mandrel_rotation: r })),
    ]
}

fn wind_definition() -> impl Strategy<Value = WindDefinition> {
    (
        1.0f64..1000.0,
        1.0f64..5000.0,
        0.1f64..20.0,
        0.01f64..2.0,
        prop::collection::vec(wire_layer(), 0..12),
    )
        .prop_map(|(diameter, wind_length, width, thickness, layers)| WindDefinition {
            mandrel_parameters: MandrelParameters {
                diameter,
                wind_length,
            },
            tow_parameters: TowParameters { width, thickness },
            default_feed_rate: DEFAULT_FEED_RATE,
            layers,
        })
}

proptest! {
    #[test]
    fn wind_definition_survives_project_round_trip(def in wind_definition()) {
        let project = wind_definition_to_project(&def, "job.wind");
        prop_assert_eq!(project_to_wind_definition(&project, None), def);
    }
}

#[test]
fn document_round_trips_through_text() {
    let project = load_project_from_str(DOCUMENT, "tank.wind").unwrap();
    assert_eq!(project.layers.len(), 4);
    assert!(!project.is_dirty);

    let text = project_to_wind_definition(&project, None)
        .to_json_pretty()
        .unwrap();
    let reparsed = WindDefinition::parse(&text).unwrap();
    assert_eq!(reparsed, WindDefinition::parse(DOCUMENT).unwrap());
}

#[test]
fn exported_keys_follow_wire_order() {
    let project = load_project_from_str(DOCUMENT, "tank.wind").unwrap();
    let text = project_to_wind_definition(&project, Some(2))
        .to_json()
        .unwrap();

    let order = ["mandrelParameters", "towParameters", "defaultFeedRate", "layers"];
    let positions: Vec<usize> = order.iter().map(|k| text.find(k).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));

    let helical = [
        "windAngle",
        "patternNumber",
        "skipIndex",
        "lockDegrees",
        "leadInMM",
        "leadOutDegrees",
        "skipInitialNearLock",
    ];
    let positions: Vec<usize> = helical.iter().map(|k| text.find(k).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(!text.contains("mandrelRotation"));
}

#[test]
fn unknown_wind_type_leaves_loaded_project_untouched() {
    let mut store = ProjectStore::new();
    store.load_project(load_project_from_str(DOCUMENT, "tank.wind").unwrap());
    store.add_layer(LayerType::Skip);
    let before = store.project().clone();

    let broken = DOCUMENT.replace(r#""windType": "skip""#, r#""windType": "polar""#);
    match load_project_from_str(&broken, "broken.wind") {
        Err(WindFileError::UnknownWindType { index, wind_type }) => {
            assert_eq!(index, 2);
            assert_eq!(wind_type, "polar");
        }
        other => panic!("expected unknown windType, got {:?}", other),
    }

    assert_eq!(store.project(), &before);
    assert!(store.is_dirty());
}

#[test]
fn unparseable_json_is_a_load_error() {
    let err = load_project_from_str("{ not json", "x.wind").unwrap_err();
    assert!(matches!(err, WindFileError::InvalidJson { .. }));
}

#[test]
fn unset_near_lock_is_written_back_unset() {
    let document = DOCUMENT.replace(
        r#""skipInitialNearLock": true"#,
        r#""skipInitialNearLock": null"#,
    );
    let def = WindDefinition::parse(&document).unwrap();
    let project = wind_definition_to_project(&def, "tank.wind");
    assert_eq!(project_to_wind_definition(&project, None), def);

    let without_key = DOCUMENT.replace(",\n      \"skipInitialNearLock\": true", "");
    let def = WindDefinition::parse(&without_key).unwrap();
    let back = project_to_wind_definition(&wind_definition_to_project(&def, "tank.wind"), None);
    match back.layers[1] {
        WindLayer::Helical(h) => assert_eq!(h.skip_initial_near_lock, None),
        other => panic!("expected helical, got {:?}", other),
    }
}
