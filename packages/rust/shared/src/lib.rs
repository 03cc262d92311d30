//! Shared types, error model, and configuration for ProposalKit.
//!
//! Every other ProposalKit crate depends on this one for [`ProposalKitError`],
//! the domain types ([`ProposalRecord`], [`DatabaseResource`],
//! [`OrganizationRecord`], [`FiscalYear`]) and configuration loading.

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogConfig, DedupConfig, OutputConfig, ScanConfig, SegmenterConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ProposalKitError, Result};
pub use types::{
    DatabaseResource, FiscalYear, Organization, OrganizationRecord, ProposalRecord,
    RESOURCE_TYPE, ResourceFile, ResourceMetadata, ResourceSummary, Status, UNKNOWN_KEY,
    fiscal_year_key, priority_of,
};
