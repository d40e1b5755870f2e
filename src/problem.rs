use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A problem to grade against, as supplied by the caller
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Problem {
    pub statement: String,

    /// Reference solution(s), free text
    #[serde(alias = "solution")]
    pub solutions: String,

    #[serde(default)]
    pub validity_requirements: Option<String>,

    #[serde(default)]
    pub quality_requirements: Option<String>,
}

impl Problem {
    /// Load a problem from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn validity_requirements(&self) -> &str {
        self.validity_requirements.as_deref().unwrap_or("")
    }

    pub fn quality_requirements(&self) -> &str {
        self.quality_requirements.as_deref().unwrap_or("")
    }
}
