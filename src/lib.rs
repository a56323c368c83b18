//! qcscan library
//!
//! Scans a partitioned sequencing analysis archive for batches of file
//! identifiers: classifies why QC reports are missing and extracts QC metrics
//! from the reports that exist.

pub mod analyzer;
pub mod archive;
pub mod cli;
pub mod config;
pub mod decrypt;
pub mod output;
pub mod pipeline;
pub mod utils;

pub use analyzer::{AnalysisResult, Analyzer, AnalyzerKind, AnalyzerSettings, Finding};
pub use archive::{ArchiveLayout, ArtifactSet, Identifier};
pub use config::Config;
pub use pipeline::{run, PoolKind, RunOptions, RunReport};
pub use utils::ProcessGuard;
