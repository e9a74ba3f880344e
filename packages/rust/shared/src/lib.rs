//! Shared types, error model, and configuration for Adit.
//!
//! This crate is the foundation depended on by all other Adit crates.
//! It provides:
//! - [`AditError`]: the unified error type
//! - Domain types ([`ContentNode`], [`PredicateSet`], [`NavEntry`], [`ExportManifest`])
//! - Configuration ([`AppConfig`], [`CatalogOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogConfig, CatalogOptions, DefaultsConfig, MAX_HEADING_DEPTH, TocConfig,
    TocOptions, WikiConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, render_config,
};
pub use error::{AditError, Result};
pub use types::{
    Breadcrumb, BreadcrumbTrail, CURRENT_SCHEMA_VERSION, ContentNode, ExportId, ExportManifest,
    NavEntry, NodeKind, PageRecord, Predicate, PredicateSet,
};
