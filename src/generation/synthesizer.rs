use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use log::{error, info, warn};
use serde::Serialize;

use super::fallback::fallback_specification;
use super::spec::PipelineSpecification;
use crate::ai::prompts::{generation_prompt, GENERATION_SYSTEM_PROMPT, GENERATION_TEMPERATURE};
use crate::ai::{GenerationRequest, TextGenerator};
use crate::insights::TechStackProfile;

/// Project requirements fed into synthesis, each defaulted when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirements {
    pub testing: String,
    pub security: String,
    pub performance: String,
    pub compliance: String,
    pub budget: String,
    pub deployment_frequency: String,
    pub environments: String,
}

impl Default for Requirements {
    fn default() -> Self {
        Self {
            testing: "Standard unit and integration tests".to_string(),
            security: "Standard security scanning".to_string(),
            performance: "Optimized for development speed".to_string(),
            compliance: "None specified".to_string(),
            budget: "Standard".to_string(),
            deployment_frequency: "Daily".to_string(),
            environments: "Dev, Staging, Production".to_string(),
        }
    }
}

impl Requirements {
    /// Reads the known keys from a free-form mapping. Unknown keys are ignored
    /// and non-string values are rendered as JSON text.
    pub fn from_map(map: &IndexMap<String, serde_json::Value>) -> Self {
        let defaults = Self::default();
        let field = |key: &str, default: String| match map.get(key) {
            None | Some(serde_json::Value::Null) => default,
            Some(serde_json::Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        };

        Self {
            testing: field("testing", defaults.testing),
            security: field("security", defaults.security),
            performance: field("performance", defaults.performance),
            compliance: field("compliance", defaults.compliance),
            budget: field("budget", defaults.budget),
            deployment_frequency: field("deployment_frequency", defaults.deployment_frequency),
            environments: field("environments", defaults.environments),
        }
    }
}

/// Outcome of one synthesis: the specification and whether the AI produced it.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub specification: PipelineSpecification,
    pub ai_backed: bool,
}

/// Turns a tech-stack profile and requirements into a pipeline specification.
///
/// Makes one call to the text generator, bounded by `timeout`. A failed,
/// slow or unparseable reply falls back to the deterministic specification.
pub struct SpecificationSynthesizer {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl SpecificationSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub async fn synthesize(
        &self,
        profile: &TechStackProfile,
        requirements: &Requirements,
        deployment_target: &str,
        team_size: &str,
    ) -> Synthesis {
        let request = GenerationRequest::new(generation_prompt(
            profile,
            requirements,
            deployment_target,
            team_size,
        ))
        .with_system_prompt(GENERATION_SYSTEM_PROMPT)
        .with_temperature(GENERATION_TEMPERATURE);

        let reply = tokio::time::timeout(self.timeout, self.generator.generate(&request)).await;

        let specification = match reply {
            Ok(Ok(text)) => match PipelineSpecification::from_reply(&text) {
                Ok(spec) => {
                    info!(
                        "Using AI-generated specification from {}",
                        self.generator.name()
                    );
                    return Synthesis {
                        specification: spec,
                        ai_backed: true,
                    };
                }
                Err(e) => {
                    warn!("Generated specification unusable ({e}), using fallback");
                    None
                }
            },
            Ok(Err(e)) => {
                error!("AI pipeline specification generation failed: {e}");
                None
            }
            Err(_) => {
                warn!(
                    "AI pipeline specification timed out after {}s, using fallback",
                    self.timeout.as_secs()
                );
                None
            }
        };

        Synthesis {
            specification: specification
                .unwrap_or_else(|| fallback_specification(profile, deployment_target)),
            ai_backed: false,
        }
    }
}
