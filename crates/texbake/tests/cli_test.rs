//! Runs the command-line front end against files on disk.

use std::fs;

use texbake::cli::{run, CliArgs};
use texbake::*;

fn write_scene(dir: &std::path::Path) -> std::path::PathBuf {
    let scene = Scene::new()
        .with_camera(Camera::new("Front").looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y))
        .with_light(Light::directional("Key", Vec3::NEG_Z))
        .with_object(MeshObject::quad("Card", Vec3::ZERO, 1.0));
    let path = dir.join("scene.json");
    fs::write(&path, serde_json::to_string_pretty(&scene).unwrap()).unwrap();
    path
}

#[test]
fn bakes_scene_file_and_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let scene = write_scene(dir.path());
    let out = dir.path().join("sprites");
    let report = dir.path().join("report.json");
    let args = CliArgs::parse([
        "texbake".to_string(),
        "--scene".to_string(),
        scene.display().to_string(),
        "--camera".to_string(),
        "Front".to_string(),
        "--out".to_string(),
        out.display().to_string(),
        "--width".to_string(),
        "16".to_string(),
        "--height".to_string(),
        "16".to_string(),
        "--report".to_string(),
        report.display().to_string(),
    ])
    .unwrap();

    let results = run(&args).unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_success(), "{}", results[0]);
    assert!(out.join("Front_Depth.exr").is_file());
    assert!(out.join("Front_Shaded_Key.png").is_file());

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json[0]["camera"], "Front");
    assert_eq!(json[0]["state"], "Done");
    assert_eq!(json[0]["passes"][0]["label"], "Depth");
}

#[test]
fn options_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let scene = write_scene(dir.path());
    let config = dir.path().join("options.json");
    fs::write(
        &config,
        r#"{ "output_width": 8, "output_height": 8, "passes": { "depth": false, "albedo": true,
             "ambient_occlusion": false, "alpha": false, "normal": false, "shaded": false,
             "shadow": false } }"#,
    )
    .unwrap();
    let out = dir.path().join("albedo_only");
    let args = CliArgs {
        scene,
        cameras: vec!["Front".to_string()],
        config: Some(config),
        out: Some(out.clone()),
        ..CliArgs::default()
    };

    let results = run(&args).unwrap();
    assert_eq!(results[0].written_files(), [out.join("Front_Albedo.png").as_path()]);
}

#[test]
fn unknown_camera_reports_failure_without_erroring() {
    let dir = tempfile::tempdir().unwrap();
    let args = CliArgs {
        scene: write_scene(dir.path()),
        cameras: vec!["Back".to_string()],
        out: Some(dir.path().join("out")),
        ..CliArgs::default()
    };

    let results = run(&args).unwrap();
    assert_eq!(results[0].state, BakeState::Failed);
    assert!(results[0].error.as_deref().unwrap().contains("'Back'"));
}

#[test]
fn missing_scene_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let args = CliArgs {
        scene: dir.path().join("nope.json"),
        cameras: vec!["Front".to_string()],
        ..CliArgs::default()
    };
    let err = run(&args).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to load scene"));
}
