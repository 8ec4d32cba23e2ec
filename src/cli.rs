use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ai::AiService;
use crate::auth::Token;
use crate::config::{AiProvider, Config, OutputFormat};
use crate::generation::{render, validate_dependencies, PipelineSpecification};
use crate::insights::{Envelope, OptimizeAnalysis};
use crate::orchestrator::{PipelineOrchestrator, ProjectDescription};
use crate::output::{self, PhaseProgress};
use crate::pipeline::{calculate_review_metrics, Thresholds};
use crate::stack::{collect_paths, detect_tech_stack};

#[derive(Parser)]
#[command(name = "pipelens")]
#[command(author, version, about = "CI/CD Pipeline Analysis & Generation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./pipelens.toml or the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    #[arg(long, global = true, value_enum)]
    provider: Option<AiProvider>,

    #[arg(long, global = true)]
    model: Option<String>,

    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, global = true, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_api_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze existing pipeline documents
    Optimize {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Design a new pipeline for a project
    Generate {
        /// JSON or YAML project description
        #[arg(long, required_unless_present = "files")]
        project: Option<PathBuf>,

        /// Project files or directories to detect the stack from
        #[arg(long, num_args = 1..)]
        files: Vec<PathBuf>,

        #[arg(long)]
        deployment_target: Option<String>,

        #[arg(long)]
        team_size: Option<String>,

        /// Requirement as KEY=VALUE, e.g. `testing="E2E only"`
        #[arg(long = "requirement", value_parser = parse_requirement)]
        requirements: Vec<(String, String)>,
    },
    /// Detect the technology stack from file paths
    Detect {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Render a pipeline specification into platform documents
    Render {
        #[arg(long)]
        spec: PathBuf,
    },
    /// Score a code review from its finding counts
    Score {
        #[arg(long, default_value_t = 0)]
        critical: usize,

        #[arg(long, default_value_t = 0)]
        high: usize,

        /// Number of changed lines
        #[arg(long, default_value_t = 0)]
        changes: usize,

        /// Reviewer-supplied starting score
        #[arg(long)]
        base_score: Option<f64>,
    },
}

fn parse_requirement(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Reads a JSON or YAML document, chosen by extension.
fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    let document = match extension {
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON: {}", path.display()))?,
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML: {}", path.display()))?,
        _ => serde_json::from_str(&contents)
            .or_else(|_| serde_yaml::from_str(&contents))
            .with_context(|| format!("Failed to parse {}", path.display()))?,
    };
    Ok(document)
}

/// Expands directories into their file listings; other paths are kept verbatim.
fn expand_paths(paths: &[PathBuf]) -> Result<Vec<String>> {
    let mut expanded = Vec::new();
    for path in paths {
        if path.is_dir() {
            expanded.extend(
                collect_paths(path)
                    .with_context(|| format!("Failed to list {}", path.display()))?,
            );
        } else {
            expanded.push(path.display().to_string());
        }
    }
    Ok(expanded)
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(provider) = self.provider {
            config.ai.provider = provider;
        }
        if let Some(model) = &self.model {
            config.ai.model.clone_from(model);
        }
        if let Some(key) = &self.openai_api_key {
            config.ai.openai_api_key = Some(Token::from(key.as_str()));
        }
        if let Some(key) = &self.anthropic_api_key {
            config.ai.anthropic_api_key = Some(Token::from(key.as_str()));
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        config.output.pretty |= self.pretty;

        Ok(config)
    }

    fn orchestrator(config: &Config) -> Result<PipelineOrchestrator> {
        let service = if config.ai.provider == AiProvider::Mock {
            AiService::offline()
        } else {
            AiService::from_config(config)?
        };
        let model = service.model().to_string();
        Ok(PipelineOrchestrator::new(
            Arc::new(service),
            config.analysis.clone(),
            model,
        ))
    }

    /// Prints the summary when no machine format or output file was asked for;
    /// otherwise serializes `value` (JSON when the format is summary).
    fn emit<T: Serialize>(&self, config: &Config, value: &T, summary: impl FnOnce()) -> Result<()> {
        let format = config.output.format;
        let pretty = config.output.pretty;

        match (&self.output, format) {
            (None, OutputFormat::Summary) => {
                summary();
                Ok(())
            }
            (None, format) => output::export(value, format, pretty, &mut std::io::stdout()),
            (Some(path), format) => {
                let format = if format == OutputFormat::Summary {
                    OutputFormat::Json
                } else {
                    format
                };
                let mut buffer = Vec::new();
                output::export(value, format, pretty, &mut buffer)?;
                std::fs::File::create(path)
                    .and_then(|mut file| file.write_all(&buffer))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Report written to: {}", path.display());
                Ok(())
            }
        }
    }

    async fn execute_optimize(&self, config: &Config, files: &[PathBuf]) -> Result<()> {
        let orchestrator = Self::orchestrator(config)?;

        let progress = PhaseProgress::start(2, format!("Reading {} pipeline files", files.len()));
        let inputs: Vec<(String, std::io::Result<Vec<u8>>)> = files
            .iter()
            .map(|path| (path.display().to_string(), std::fs::read(path)))
            .collect();

        let progress = progress.next("Analyzing pipelines");
        let orchestrator = &orchestrator;
        let envelopes: Vec<Envelope<OptimizeAnalysis>> =
            join_all(inputs.iter().map(|(name, content)| async move {
                match content {
                    Ok(bytes) => orchestrator.optimize(name, bytes).await,
                    Err(e) => Envelope::error(Some(name.clone()), format!("Failed to read file: {e}")),
                }
            }))
            .await;
        progress.finish();

        let failed = envelopes.iter().filter(|e| !e.is_success()).count();

        if envelopes.len() == 1 {
            self.emit(config, &envelopes[0], || {
                output::print_optimize_summary(&envelopes[0]);
            })?;
        } else {
            self.emit(config, &envelopes, || {
                println!("{}", output::render_optimize_overview(&envelopes));
                for envelope in &envelopes {
                    output::print_optimize_summary(envelope);
                }
            })?;
        }

        if failed > 0 {
            bail!("{failed} of {} pipeline files could not be analyzed", envelopes.len());
        }
        Ok(())
    }

    async fn execute_generate(
        &self,
        config: &Config,
        project: Option<&Path>,
        files: &[PathBuf],
        deployment_target: Option<&str>,
        team_size: Option<&str>,
        requirements: &[(String, String)],
    ) -> Result<()> {
        let orchestrator = Self::orchestrator(config)?;

        let progress = PhaseProgress::start(2, "Scanning project files");
        let mut description = match project {
            Some(path) => load_document::<ProjectDescription>(path)?,
            None => ProjectDescription::default(),
        };
        description.codebase_files.extend(expand_paths(files)?);
        if let Some(target) = deployment_target {
            description.deployment_target = target.to_string();
        }
        if let Some(size) = team_size {
            description.team_size = size.to_string();
        }
        for (key, value) in requirements {
            description
                .requirements
                .insert(key.clone(), serde_json::Value::String(value.clone()));
        }

        let progress = progress.next("Designing pipeline");
        let envelope = orchestrator.generate(&description).await;
        progress.finish();

        self.emit(config, &envelope, || output::print_generate_summary(&envelope))?;

        if let Some(message) = envelope.message.as_deref().filter(|_| !envelope.is_success()) {
            bail!("Pipeline generation failed: {message}");
        }
        Ok(())
    }

    fn execute_detect(&self, config: &Config, paths: &[PathBuf]) -> Result<()> {
        let paths = expand_paths(paths)?;
        info!("Detecting technologies across {} paths", paths.len());
        let profile = detect_tech_stack(&paths);
        self.emit(config, &profile, || output::print_stack(&profile))
    }

    fn execute_render(&self, config: &Config, spec: &Path) -> Result<()> {
        let spec: PipelineSpecification = load_document(spec)?;
        for issue in validate_dependencies(&spec) {
            warn!("Specification issue in job '{}': {}", issue.job, issue.detail);
        }
        let documents = render(&spec);
        self.emit(config, &documents, || output::print_documents(&documents))
    }

    pub async fn execute(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.command {
            Commands::Optimize { files } => self.execute_optimize(&config, files).await,
            Commands::Generate {
                project,
                files,
                deployment_target,
                team_size,
                requirements,
            } => {
                self.execute_generate(
                    &config,
                    project.as_deref(),
                    files,
                    deployment_target.as_deref(),
                    team_size.as_deref(),
                    requirements,
                )
                .await
            }
            Commands::Detect { paths } => self.execute_detect(&config, paths),
            Commands::Render { spec } => self.execute_render(&config, spec),
            Commands::Score {
                critical,
                high,
                changes,
                base_score,
            } => {
                let metrics = calculate_review_metrics(
                    *critical,
                    *high,
                    *changes,
                    *base_score,
                    &Thresholds::DEFAULT,
                );
                self.emit(&config, &metrics, || output::print_review(&metrics))
            }
        }
    }
}
