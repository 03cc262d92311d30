//! Batch stages and the database formatter for ProposalKit.
//!
//! This crate ties together document extraction, duplicate handling and the
//! catalog into the stage commands exposed by the CLI (e.g., [`stages::run_pipeline`]).

pub mod format;
pub mod stages;
