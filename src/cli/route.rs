//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::help::{command_name, command_sheet_id};
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_generation_ack, format_generation_result, format_import_result, format_recover_result,
    format_sheet_list, format_sheet_status, format_validation_report,
};
use crate::config::{ConfigLoader, SheetsmithConfig};
use crate::error::{ApiError, StorageError};
use crate::generation::{
    FrameGenerationClient, FrameStateStore, GenerationOrchestrator, GenerationRequest,
    GenerationService, ImageCompositeAssembler, Priority,
};
use crate::sheet::{SheetDefinition, WorldStyle};
use crate::storage::{FilesystemObjectStore, ObjectStore, SheetStore, SledSheetStore};
use crate::validation::validate_sheet;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Runtime context for CLI execution: workspace, configuration and storage.
/// The image model is only built for commands that generate.
pub struct RunContext {
    config: SheetsmithConfig,
    workspace_root: PathBuf,
    state: Arc<FrameStateStore>,
    objects: Arc<FilesystemObjectStore>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::from_config(workspace_root, config)
    }

    pub fn from_config(workspace_root: PathBuf, config: SheetsmithConfig) -> Result<Self, ApiError> {
        if let Err(errors) = config.validate() {
            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(ApiError::ConfigError(joined.join("; ")));
        }

        let (store_path, objects_path) = config.storage.resolve_paths(&workspace_root);
        let records: Arc<dyn SheetStore> = Arc::new(SledSheetStore::open(&store_path)?);
        let objects = Arc::new(FilesystemObjectStore::new(
            &objects_path,
            config.storage.public_base_url.clone(),
        )?);

        Ok(Self {
            config,
            workspace_root,
            state: Arc::new(FrameStateStore::new(records)),
            objects,
        })
    }

    pub fn config(&self) -> &SheetsmithConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn state(&self) -> &Arc<FrameStateStore> {
        &self.state
    }

    /// Build the generation service with the configured image model.
    pub fn build_service(&self) -> Result<GenerationService, ApiError> {
        let model = self.config.provider.build_client()?;
        let objects: Arc<dyn ObjectStore> = self.objects.clone();
        let client = Arc::new(FrameGenerationClient::new(
            model,
            Arc::clone(&objects),
            self.config.generation.frame_timeout(),
        ));
        let composite = Arc::new(ImageCompositeAssembler::new(objects));
        let orchestrator = GenerationOrchestrator::new(
            Arc::clone(&self.state),
            client,
            composite,
            self.config.generation.clone(),
        );
        Ok(GenerationService::new(Arc::new(orchestrator)))
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        info!(command = name, sheet_id = command_sheet_id(command), "Command started");
        let result = self.execute_inner(command);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(command = name, elapsed_ms, "Command finished"),
            Err(e) => warn!(command = name, elapsed_ms, error = %e, "Command failed"),
        }
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Import { path, format } => {
                let definition: SheetDefinition = load_document(path)?;
                let mut sheet = definition.into_sheet();
                validate_sheet(&sheet).into_result()?;
                if self.state.store().get_sheet(&sheet.id)?.is_some() {
                    return Err(ApiError::Validation(vec![format!(
                        "sheet '{}' already exists",
                        sheet.id
                    )]));
                }
                self.state.save(&mut sheet)?;
                format_import_result(&sheet, format)
            }
            Commands::Validate { path, format } => {
                let definition: SheetDefinition = load_document(path)?;
                let report = validate_sheet(&definition.into_sheet());
                format_validation_report(&report, format)
            }
            Commands::Generate {
                sheet_id,
                frames,
                priority,
                batch_size,
                world_style,
                format,
            } => {
                let priority: Priority = priority
                    .parse()
                    .map_err(|e: String| ApiError::Validation(vec![e]))?;
                let mut request = GenerationRequest::for_sheet(sheet_id.clone()).with_priority(priority);
                if let Some(frames) = frames {
                    request = request.with_frames(frames.clone());
                }
                if let Some(size) = batch_size {
                    request = request.with_batch_size(*size);
                }
                if let Some(path) = world_style {
                    let style: WorldStyle = load_document(path)?;
                    request = request.with_world_style(style);
                }
                self.run_generation(request, format)
            }
            Commands::Status { sheet_id, format } => {
                let sheet = self.state.load(sheet_id).map_err(|e| match e {
                    StorageError::SheetNotFound(id) => ApiError::SheetNotFound(id),
                    other => ApiError::StorageError(other),
                })?;
                format_sheet_status(&sheet, format)
            }
            Commands::List { format } => {
                let sheets = self.state.store().list_sheets()?;
                format_sheet_list(&sheets, format)
            }
            Commands::Recover => {
                let changed = self.state.recover_interrupted()?;
                Ok(format_recover_result(changed))
            }
        }
    }

    fn run_generation(&self, request: GenerationRequest, format: &str) -> Result<String, ApiError> {
        let service = self.build_service()?;
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| ApiError::JobFailed(format!("Failed to create runtime: {}", e)))?;
        rt.block_on(async {
            let ack = service.start_generation(request)?;
            let ack_line = format_generation_ack(&ack);
            if format != "json" {
                eprintln!("{}", ack_line);
            }
            let result = service.wait(&ack.sheet_id).await?;
            format_generation_result(&result, format)
        })
    }
}

/// Read a JSON or TOML document, chosen by file extension.
fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ApiError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ApiError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        toml::from_str(&contents)
            .map_err(|e| ApiError::ConfigError(format!("Failed to parse {}: {}", path.display(), e)))
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| ApiError::ConfigError(format!("Failed to parse {}: {}", path.display(), e)))
    }
}
