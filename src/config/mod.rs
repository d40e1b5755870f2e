mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config: Config = serde_yaml::from_str(&content)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reruns == 0 {
            return Err(ConfigError::Invalid("reruns must be at least 1".into()));
        }
        if self.vote_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "vote_concurrency must be at least 1".into(),
            ));
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.base_url is empty".into()));
        }
        Ok(())
    }

    /// Read every stage's instruction and example files
    pub fn load_prompts(&self) -> Result<PromptSet, ConfigError> {
        Ok(PromptSet {
            sanity: self.load_stage(&self.stages.sanity)?,
            refiner: self.load_stage(&self.stages.refiner)?,
            validity: self.load_stage(&self.stages.validity)?,
            quality: self.load_stage(&self.stages.quality)?,
            cleaner: self.load_stage(&self.stages.cleaner)?,
        })
    }

    fn load_stage(&self, stage: &StageConfig) -> Result<StagePrompt, ConfigError> {
        let instructions = self.read_prompt(&stage.instructions_file)?;
        let examples = match &stage.examples_file {
            Some(path) => self.read_prompt(path)?,
            None => String::new(),
        };
        Ok(StagePrompt {
            model: stage.model.clone(),
            instructions,
            examples,
        })
    }

    fn read_prompt(&self, path: &Path) -> Result<String, ConfigError> {
        let resolved = self.resolve(path);
        std::fs::read_to_string(&resolved).map_err(|e| ConfigError::ReadPrompt {
            path: resolved,
            source: e,
        })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}
