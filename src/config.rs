use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::Token;

/// Configuration file structure for PipeLens.
///
/// Holds the read-only knobs consumed by the analysis engine: AI provider
/// settings, document limits and output preferences. Every field has a default
/// so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// AI provider settings
    #[serde(default)]
    pub ai: AiConfig,

    /// Analysis limits
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    #[value(name = "openai")]
    OpenAi,
    Anthropic,
    Mock,
}

impl AiProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AiConfig {
    /// Provider used when a request does not name one
    #[serde(default)]
    pub provider: AiProvider,

    /// Model identifier sent to the provider
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    pub openai_api_key: Option<Token>,

    pub anthropic_api_key: Option<Token>,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    #[serde(default = "default_anthropic_base_url")]
    pub anthropic_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalysisConfig {
    /// Maximum pipeline document size in characters
    #[serde(default = "default_max_document_size")]
    pub max_document_size: usize,

    /// Upper bound for a single AI call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// File extensions accepted by the optimize flow
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
    Yaml,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            openai_api_key: None,
            anthropic_api_key: None,
            openai_base_url: default_openai_base_url(),
            anthropic_base_url: default_anthropic_base_url(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_document_size: default_max_document_size(),
            timeout_secs: default_timeout_secs(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_temperature() -> f32 {
    0.1
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_max_document_size() -> usize {
    50_000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".yaml".to_string(), ".yml".to_string()]
}

const CANDIDATES: [&str; 4] = [
    "pipelens.toml",
    "pipelens.json",
    "pipelens.yaml",
    "pipelens.yml",
];

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./pipelens.toml, ./pipelens.json, ./pipelens.yaml, ./pipelens.yml
    /// 3. `<user config dir>/pipelens/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if path.exists() {
                return Self::load_from_path(path);
            }
            log::warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let user_config = dirs::config_dir().map(|dir| dir.join("pipelens").join("config.toml"));
        Self::discover(Path::new("."), user_config.as_deref())
    }

    fn discover(base_dir: &Path, user_config: Option<&Path>) -> Result<Self> {
        let found = CANDIDATES
            .iter()
            .map(|candidate| base_dir.join(candidate))
            .chain(user_config.map(Path::to_path_buf))
            .find(|path: &PathBuf| path.exists());

        match found {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        let config: Self = match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Token for the configured provider, if one is set and non-empty.
    pub fn api_key(&self, provider: AiProvider) -> Option<&Token> {
        let token = match provider {
            AiProvider::OpenAi => self.ai.openai_api_key.as_ref(),
            AiProvider::Anthropic => self.ai.anthropic_api_key.as_ref(),
            AiProvider::Mock => None,
        };
        token.filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ai.provider, AiProvider::OpenAi);
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.ai.max_tokens, 4000);
        assert_eq!(config.analysis.max_document_size, 50_000);
        assert_eq!(config.analysis.timeout_secs, 30);
        assert_eq!(config.analysis.allowed_extensions, vec![".yaml", ".yml"]);
        assert_eq!(config.output.format, OutputFormat::Summary);
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[ai]
provider = "anthropic"
model = "claude-3-haiku-20240307"
anthropic-api-key = "sk-ant-test"

[analysis]
max-document-size = 1000
timeout-secs = 5

[output]
format = "json"
pretty = true
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.ai.provider, AiProvider::Anthropic);
        assert_eq!(config.ai.model, "claude-3-haiku-20240307");
        assert_eq!(
            config.api_key(AiProvider::Anthropic).map(Token::as_str),
            Some("sk-ant-test")
        );
        assert!(config.api_key(AiProvider::OpenAi).is_none());
        assert_eq!(config.analysis.max_document_size, 1000);
        assert_eq!(config.analysis.timeout_secs, 5);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        let json_content = r#"{
  "ai": { "provider": "mock", "temperature": 0.5 },
  "output": { "format": "yaml" }
}"#;
        write!(temp_file, "{}", json_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.ai.provider, AiProvider::Mock);
        assert!((config.ai.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.output.format, OutputFormat::Yaml);
        assert_eq!(config.analysis.max_document_size, 50_000);
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yml").unwrap();
        write!(temp_file, "analysis:\n  timeout-secs: 12\n").unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.analysis.timeout_secs, 12);
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load(Some(Path::new("nonexistent.toml"))).unwrap();
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.analysis.max_document_size, 50_000);
    }

    #[test]
    fn test_discover_prefers_working_directory_candidates() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join("pipelens.yaml"),
            "ai:\n  model: local-model\n",
        )
        .unwrap();
        let user_config = temp_dir.path().join("user.toml");
        std::fs::write(&user_config, "[ai]\nmodel = \"user-model\"\n").unwrap();

        let config = Config::discover(temp_dir.path(), Some(&user_config)).unwrap();
        assert_eq!(config.ai.model, "local-model");
    }

    #[test]
    fn test_discover_falls_back_to_user_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let user_config = temp_dir.path().join("config.toml");
        std::fs::write(&user_config, "[ai]\nmodel = \"user-model\"\n").unwrap();

        let config = Config::discover(temp_dir.path(), Some(&user_config)).unwrap();
        assert_eq!(config.ai.model, "user-model");
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let mut config = Config::default();
        config.ai.openai_api_key = Some(Token::from(""));
        assert!(config.api_key(AiProvider::OpenAi).is_none());
    }

    #[test]
    fn test_config_serializes_without_leaking_defaults() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("max-document-size = 50000"));
        assert!(toml.contains("provider = \"openai\""));
    }
}
