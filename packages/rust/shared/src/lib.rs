//! Shared types, error model, and configuration for WebScout.
//!
//! This crate is the foundation depended on by all other WebScout crates.
//! It provides:
//! - [`WebScoutError`] — the unified error type, plus the wire-level
//!   [`ErrorEnvelope`] and [`format_error`]
//! - Domain types ([`SearchRequest`], [`Source`], [`ResponseEnvelope`],
//!   [`KnowledgeGraph`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ResearchConfig, ServerConfig, StorageConfig, TavilyConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{ErrorEnvelope, Result, WebScoutError, format_error};
pub use types::{
    ContentType, EnvelopeMetadata, GraphLink, GraphNode, KnowledgeGraph, NodeKind,
    ResponseEnvelope, SearchRequest, Source, extract_domain,
};
