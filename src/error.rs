use std::path::PathBuf;
use thiserror::Error;

#[allow(dead_code)]
#[derive(Error, Debug)]
pub enum FttError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Failed to read prompt file '{path}': {source}")]
    ReadPrompt {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Environment variable '{0}' with the API key is not set")]
    MissingApiKey(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Completion contained no message content")]
    EmptyCompletion,
}

/// Failures that abort a whole evaluation. Model disagreement is never one of
/// these; only transport problems surface here.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Model call failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Raised while combining validity and quality feedback. Always caught at the
/// merge boundary and turned into the `"-"` fallback record.
#[derive(Error, Debug, PartialEq)]
pub enum MergeError {
    #[error("Field '{0}' is missing from the feedback record")]
    MissingField(&'static str),

    #[error("Field '{field}' is not a percentage: {value}")]
    BadPercentage { field: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write report: {0}")]
    WriteReport(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
