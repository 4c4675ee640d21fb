//! Integration tests for the Sheetsmith generation orchestrator

mod batch_scheduling;
mod cli_binary;
mod config_integration;
mod generation_runs;
mod service_jobs;
