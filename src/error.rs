use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipeLensError {
    #[error("No file provided")]
    EmptyInput,

    #[error("No project data provided")]
    EmptyProject,

    #[error("File must be YAML format (.yaml or .yml): {0}")]
    UnsupportedExtension(String),

    #[error("Pipeline file too large. Maximum size: {max} characters (got {size})")]
    DocumentTooLarge { size: usize, max: usize },

    #[error("Pipeline file is not valid UTF-8 text")]
    InvalidUtf8,

    #[error("YAML parsing error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("AI generation failed: {0}")]
    Ai(String),

    #[error("AI request timed out after {0} seconds")]
    Timeout(u64),

    #[error("AI API request failed with status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipeLensError {
    /// Problems with the caller's input, reported verbatim in an error envelope.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::EmptyProject
                | Self::UnsupportedExtension(_)
                | Self::DocumentTooLarge { .. }
                | Self::InvalidUtf8
                | Self::Parse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipeLensError>;
