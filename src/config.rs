// Engine configuration
use crate::standard::{StandardConcept, StatementType};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A company concept pinned to a standard concept for one statement type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptOverride {
    pub concept: String,
    pub statement_type: StatementType,
    pub standard: StandardConcept,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest accepted difference between a reported total and its summed children.
    pub tolerance: f64,
    pub label_language: String,
    pub max_periods: usize,
    pub strict: bool,
    pub parallel: bool,
    pub concept_overrides: Vec<ConceptOverride>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            label_language: "en-US".to_string(),
            max_periods: 4,
            strict: false,
            parallel: true,
            concept_overrides: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile for SEC EDGAR filings: strict, US English labels, three years.
    pub fn sec_edgar() -> Self {
        Self {
            strict: true,
            max_periods: 3,
            ..Self::default()
        }
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.label_language = language.into();
        self
    }

    pub fn with_max_periods(mut self, max_periods: usize) -> Self {
        self.max_periods = max_periods;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn with_override(
        mut self,
        concept: impl Into<String>,
        statement_type: StatementType,
        standard: StandardConcept,
    ) -> Self {
        self.concept_overrides.push(ConceptOverride {
            concept: concept.into(),
            statement_type,
            standard,
        });
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::Config(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if self.max_periods == 0 {
            return Err(Error::Config("max_periods must be at least 1".to_string()));
        }
        if self.label_language.trim().is_empty() {
            return Err(Error::Config("label_language must not be empty".to_string()));
        }
        Ok(())
    }
}
