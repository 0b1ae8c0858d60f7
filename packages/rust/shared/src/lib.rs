//! Shared types, error model, collaborator traits, and configuration for
//! Preprint Alert.
//!
//! This crate is the foundation depended on by all other Preprint Alert crates.
//! It provides:
//! - [`PreprintAlertError`] and the per-stage error types
//! - Domain types ([`Paper`], [`PaperId`], [`Analysis`], [`RunId`])
//! - The [`FeedSource`] and [`ContentFetcher`] collaborator traits
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod source;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FeedConfig, FetcherConfig, OpenRouterConfig, OutputConfig, PipelineConfig,
    apply_env_overrides, config_dir, config_file_path, init_config, load_config,
    load_config_from, resolve_api_key,
};
pub use error::{
    AnalysisError, ClassificationError, FetchError, ModelError, PipelineError,
    PreprintAlertError, Result, SynthesisError,
};
pub use source::{ContentFetcher, FeedSource};
pub use types::{Analysis, AnalysisStatus, ExtendedContent, Paper, PaperId, RunId};
