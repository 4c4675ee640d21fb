//! Integration tests for Configuration System

use crate::integration::test_utils::with_xdg_env;
use sheetsmith::cli::RunContext;
use sheetsmith::config::{ConfigLoader, ProviderType};
use sheetsmith::error::ApiError;
use tempfile::TempDir;

#[test]
fn test_workspace_config_overrides_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    std::fs::create_dir_all(workspace.join("config")).unwrap();
    std::fs::write(
        workspace.join("config").join("config.toml"),
        r#"
[provider]
provider_type = "local_custom"
model = "sdxl-turbo"
endpoint = "http://localhost:7860/v1"

[generation]
quality_batch_size = 2
pacing_ms = 250

[storage]
store_path = "data/records"
"#,
    )
    .unwrap();

    let config = with_xdg_env(&temp_dir, || ConfigLoader::load(&workspace)).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.provider.provider_type, ProviderType::LocalCustom);
    assert_eq!(config.provider.model, "sdxl-turbo");
    assert_eq!(config.generation.quality_batch_size, 2);
    assert_eq!(config.generation.speed_batch_size, 5);
    assert_eq!(config.generation.pacing_ms, 250);
    let (store, objects) = config.storage.resolve_paths(&workspace);
    assert_eq!(store, workspace.join("data/records"));
    assert_eq!(objects, workspace.join(".sheetsmith/objects"));
}

#[test]
fn test_global_config_is_below_workspace_config() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("sheetsmith")).unwrap();
    std::fs::write(
        temp_dir.path().join("sheetsmith").join("config.toml"),
        r#"
[generation]
speed_batch_size = 8
pacing_ms = 2000
"#,
    )
    .unwrap();
    let workspace = temp_dir.path().join("ws");
    std::fs::create_dir_all(workspace.join("config")).unwrap();
    std::fs::write(
        workspace.join("config").join("config.toml"),
        "[generation]\npacing_ms = 500\n",
    )
    .unwrap();

    let config = with_xdg_env(&temp_dir, || ConfigLoader::load(&workspace)).unwrap();
    assert_eq!(config.generation.speed_batch_size, 8);
    assert_eq!(config.generation.pacing_ms, 500);
}

#[test]
fn test_missing_explicit_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ApiError::ConfigError(msg) if msg.contains("not found")));
}

#[test]
fn test_run_context_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("bad.toml");
    std::fs::write(&config_file, "[generation]\nquality_batch_size = 0\n").unwrap();

    let result = with_xdg_env(&temp_dir, || {
        RunContext::new(temp_dir.path().to_path_buf(), Some(config_file.clone()))
    });
    match result {
        Err(ApiError::ConfigError(msg)) => assert!(msg.contains("batch sizes")),
        Err(other) => panic!("expected config error, got {other:?}"),
        Ok(_) => panic!("invalid config should be rejected"),
    }
}

#[test]
fn test_run_context_builds_local_provider_without_key() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("local.toml");
    std::fs::write(
        &config_file,
        r#"
[provider]
provider_type = "local_custom"
model = "local-diffusion"
endpoint = "http://127.0.0.1:9/v1"
"#,
    )
    .unwrap();

    let ctx = with_xdg_env(&temp_dir, || {
        RunContext::new(temp_dir.path().to_path_buf(), Some(config_file.clone()))
    })
    .unwrap();
    let service = ctx.build_service().unwrap();
    assert_eq!(service.orchestrator().settings().quality_batch_size, 3);
}
