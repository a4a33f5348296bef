//! Grading configuration.

use std::fs;
use std::path::Path;

use legal_annotation::DEFAULT_THRESHOLD;
use serde::{Deserialize, Serialize};

use crate::errors::{GradeError, GradeResult};
use crate::facet::Facet;

/// Configuration for a grading run.
///
/// ```toml
/// threshold = 6
/// facets = ["rule_entity", "rule_type", "relationship:refines"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingConfig {
    /// Maximum edit distance at which two spans still count as equal.
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    /// Facets to grade, in report order.
    #[serde(default = "Facet::all")]
    pub facets: Vec<Facet>,
}

fn default_threshold() -> usize {
    DEFAULT_THRESHOLD
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            facets: Facet::all(),
        }
    }
}

impl GradingConfig {
    /// Standard configuration: every facet at the default threshold.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Load from a TOML file. A missing file yields the standard configuration.
    pub fn load(path: &Path) -> GradeResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GradeError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GradeError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
