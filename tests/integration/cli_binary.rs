//! Integration tests for the sheetsmith binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const DEFINITION: &str = r#"
id = "knight"
name = "Knight"

[base_character]
description = "an armored knight with a red plume"
art_style = "pixel"
character_type = "humanoid"

[dimensions]
rows = 2
cols = 3

[frame_size]
width = 64
height = 64
"#;

fn sheetsmith(home: &Path, workspace: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sheetsmith"))
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env_remove("OPENAI_API_KEY")
        .env_remove("SHEETSMITH_LOG")
        .arg("--workspace")
        .arg(workspace)
        .arg("--quiet")
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_import_list_and_status() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();
    let definition = workspace.join("knight.toml");
    fs::write(&definition, DEFINITION).unwrap();
    let definition = definition.to_string_lossy().to_string();

    let output = sheetsmith(temp_dir.path(), &workspace, &["import", &definition]);
    assert!(
        output.status.success(),
        "import should succeed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Imported sheet knight (2x3, 6 frames)"));

    let output = sheetsmith(temp_dir.path(), &workspace, &["list", "--format", "json"]);
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["sheet_id"], "knight");
    assert_eq!(rows[0]["total_frames"], 6);
    assert_eq!(rows[0]["status"], "draft");

    let output = sheetsmith(
        temp_dir.path(),
        &workspace,
        &["status", "knight", "--format", "json"],
    );
    assert!(output.status.success());
    let sheet: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(sheet["frames"].as_array().unwrap().len(), 6);
}

#[test]
fn test_generate_without_api_key_fails_before_touching_the_sheet() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();
    let definition = workspace.join("knight.toml");
    fs::write(&definition, DEFINITION).unwrap();
    let definition = definition.to_string_lossy().to_string();

    assert!(sheetsmith(temp_dir.path(), &workspace, &["import", &definition])
        .status
        .success());

    let output = sheetsmith(temp_dir.path(), &workspace, &["generate", "knight"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("OPENAI_API_KEY"));

    let output = sheetsmith(
        temp_dir.path(),
        &workspace,
        &["status", "knight", "--format", "json"],
    );
    let sheet: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(sheet["status"], "draft");
    assert!(sheet.get("active_run").map_or(true, |v| v.is_null()));
}

#[test]
fn test_validate_rejects_bad_definition() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();
    let definition = workspace.join("bad.json");
    fs::write(
        &definition,
        r#"{"base_character": {"description": "", "art_style": "chibi", "character_type": "animal"},
            "dimensions": {"rows": 21, "cols": 1},
            "frame_size": {"width": 8, "height": 64}}"#,
    )
    .unwrap();
    let definition = definition.to_string_lossy().to_string();

    let output = sheetsmith(temp_dir.path(), &workspace, &["validate", &definition]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("invalid (3 problems)"));

    let output = sheetsmith(temp_dir.path(), &workspace, &["import", &definition]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Validation failed (3 problems)"));
}
