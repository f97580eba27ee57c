//! stitchrl - XBRL linkbase resolution and financial statement assembly
//!
//! Resolves presentation, calculation and label linkbases into per-role
//! trees, checks calculation consistency, maps company concepts onto a
//! standard vocabulary, and stitches statements from several filings into
//! one multi-period view.
//!
//! Licensed under AGPL-3.0

pub mod cache;
pub mod calculation;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod filing;
pub mod instance;
pub mod label;
pub mod linkbase;
pub mod loader;
pub mod model;
pub mod network;
pub mod presentation;
pub mod relationship;
pub mod schema;
pub mod standard;
pub mod statement;
pub mod stitch;
pub mod tree;
pub mod validator;
pub mod xml;

// Re-export main types
pub use config::EngineConfig;
pub use diagnostics::Diagnostics;
pub use filing::{Filing, FilingParser, FilingSources};
pub use loader::FilingFiles;
pub use model::{Context, Fact, Instance, Period, PeriodKey, Unit};
pub use standard::{ConceptMapper, StandardConcept, StatementType};
pub use statement::{FilingMeta, Row, Statement};
pub use stitch::{stitch, StatementStitcher};
pub use tree::Tree;
pub use validator::{CalculationValidator, ValidationReport};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    #[error("Missing root element: expected {expected}, found {found}")]
    MissingRootElement { expected: &'static str, found: String },

    #[error("Fact {concept} references unknown context {context_ref}")]
    MissingContextRef { concept: String, context_ref: String },

    #[error("Fact {concept} references unknown unit {unit_ref}")]
    MissingUnitRef { concept: String, unit_ref: String },

    #[error("Invalid period in context {context_id}: {reason}")]
    InvalidPeriod { context_id: String, reason: String },

    #[error("No filing exposes a {0} statement")]
    NoOverlappingStatementType(StatementType),

    #[error("Stitcher already finalized")]
    StitcherFinalized,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
