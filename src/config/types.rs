use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Number of independent model calls per voting stage
    #[serde(default = "default_reruns")]
    pub reruns: usize,

    /// Maximum in-flight model calls inside one vote round or cleaner batch
    #[serde(default = "default_vote_concurrency")]
    pub vote_concurrency: usize,

    /// Grade quality alongside validity; when off the overall grade is the
    /// validity letter alone
    #[serde(default = "default_true")]
    pub quality_stage_enabled: bool,

    /// Scrub answer hints from validity feedback graded B/E/F
    #[serde(default = "default_true")]
    pub hint_free_feedback: bool,

    #[serde(default)]
    pub provider: ProviderConfig,

    pub stages: StagesConfig,

    /// Directory relative prompt paths resolve against; set by `Config::load`
    #[serde(skip)]
    #[schemars(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ProviderConfig {
    /// OpenAI-compatible API root, without the trailing `/chat/completions`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_sec: default_timeout_sec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct StagesConfig {
    pub sanity: StageConfig,
    pub refiner: StageConfig,
    pub validity: StageConfig,
    pub quality: StageConfig,
    pub cleaner: StageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct StageConfig {
    #[serde(default = "default_model")]
    pub model: String,

    /// System instruction text for this stage
    pub instructions_file: PathBuf,

    /// Worked examples appended to the user prompt (sanity, validity and
    /// quality only)
    #[serde(default)]
    pub examples_file: Option<PathBuf>,
}

/// Instruction texts and model ids for every stage, read once at startup.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub sanity: StagePrompt,
    pub refiner: StagePrompt,
    pub validity: StagePrompt,
    pub quality: StagePrompt,
    pub cleaner: StagePrompt,
}

#[derive(Debug, Clone, Default)]
pub struct StagePrompt {
    pub model: String,
    pub instructions: String,
    pub examples: String,
}
