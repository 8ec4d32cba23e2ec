use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::ai::prompts::{
    optimization_prompt, OPTIMIZATION_SYSTEM_PROMPT, OPTIMIZATION_TEMPERATURE,
};
use crate::ai::{GenerationRequest, TextGenerator};
use crate::config::AnalysisConfig;
use crate::error::{PipeLensError, Result};
use crate::generation::{
    render, validate_dependencies, Requirements, SpecificationSynthesizer,
};
use crate::insights::{
    AiOptimization, Envelope, GenerateAnalysis, OptimizeAnalysis, StructureAnalysis,
};
use crate::pipeline::{
    analyze_structure, calculate_generation_metrics, calculate_optimization_metrics, scan,
    PipelineDocument, Thresholds,
};
use crate::stack::detect_tech_stack;

pub const OPTIMIZER_AGENT: &str = "PipelineOptimizerAgent-v2.0";
pub const GENERATOR_AGENT: &str = "PipelineGeneratorAgent-v2.0";

/// Input of the generate flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDescription {
    pub codebase_files: Vec<String>,
    pub requirements: IndexMap<String, serde_json::Value>,
    pub deployment_target: String,
    pub team_size: String,
}

impl Default for ProjectDescription {
    fn default() -> Self {
        Self {
            codebase_files: Vec::new(),
            requirements: IndexMap::new(),
            deployment_target: "generic".to_string(),
            team_size: "small".to_string(),
        }
    }
}

/// Sequences the analysis components for the optimize and generate flows.
///
/// Both flows always answer with an envelope. Input problems and internal
/// faults become `status = "error"`; AI failures only degrade the
/// qualitative fields.
pub struct PipelineOrchestrator {
    generator: Arc<dyn TextGenerator>,
    analysis: AnalysisConfig,
    thresholds: Thresholds,
    model: String,
}

impl PipelineOrchestrator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        analysis: AnalysisConfig,
        model: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            analysis,
            thresholds: Thresholds::DEFAULT,
            model: model.into(),
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.analysis.timeout_secs)
    }

    /// Checks an uploaded document and decodes it, before any parsing.
    fn validate(&self, filename: &str, content: &[u8]) -> Result<String> {
        if filename.trim().is_empty() || content.is_empty() {
            return Err(PipeLensError::EmptyInput);
        }

        let lowered = filename.to_lowercase();
        if !self
            .analysis
            .allowed_extensions
            .iter()
            .any(|ext| lowered.ends_with(&ext.to_lowercase()))
        {
            return Err(PipeLensError::UnsupportedExtension(filename.to_string()));
        }

        let text = std::str::from_utf8(content).map_err(|_| PipeLensError::InvalidUtf8)?;

        let size = text.chars().count();
        if size > self.analysis.max_document_size {
            return Err(PipeLensError::DocumentTooLarge {
                size,
                max: self.analysis.max_document_size,
            });
        }

        Ok(text.to_string())
    }

    /// Analyzes an existing pipeline document.
    pub async fn optimize(&self, filename: &str, content: &[u8]) -> Envelope<OptimizeAnalysis> {
        info!("Optimizing pipeline {filename}");

        match self.try_optimize(filename, content).await {
            Ok(analysis) => {
                info!(
                    "Pipeline {filename} analyzed: score {}",
                    analysis.metrics.optimization_score
                );
                Envelope::success(
                    Some(filename.to_string()),
                    analysis,
                    OPTIMIZER_AGENT,
                    &self.model,
                )
            }
            Err(e) if e.is_input_error() => {
                warn!("Rejected pipeline {filename}: {e}");
                Envelope::error(Some(filename.to_string()), e.to_string())
            }
            Err(e) => {
                error!("Pipeline optimization failed for {filename}: {e}");
                Envelope::error(
                    Some(filename.to_string()),
                    format!("Failed to optimize pipeline: {e}"),
                )
            }
        }
    }

    async fn try_optimize(&self, filename: &str, content: &[u8]) -> Result<OptimizeAnalysis> {
        let text = self.validate(filename, content)?;

        let document = PipelineDocument::parse(text);
        if let Some(message) = &document.parse_error {
            return Err(PipeLensError::Parse(message.clone()));
        }

        let structure = analyze_structure(&document);

        let (findings, (advice, ai_available)) = futures::join!(
            async { scan(&document) },
            self.advise(filename, &structure, &document.raw_text)
        );

        let metrics = calculate_optimization_metrics(&structure, &findings, &self.thresholds);

        Ok(OptimizeAnalysis {
            summary: advice.summary,
            pipeline_type: structure.pipeline_type,
            ai_available,
            ai_recommendations: advice.recommendations,
            optimization_opportunities: advice.optimization_opportunities,
            performance_improvements: advice.performance_improvements,
            security_enhancements: advice.security_enhancements,
            cost_optimizations: advice.cost_optimizations,
            static_analysis: findings,
            metrics,
            structure,
        })
    }

    /// Qualitative advice for the document; never fails.
    async fn advise(
        &self,
        filename: &str,
        structure: &StructureAnalysis,
        document: &str,
    ) -> (AiOptimization, bool) {
        let request = GenerationRequest::new(optimization_prompt(filename, structure, document))
            .with_system_prompt(OPTIMIZATION_SYSTEM_PROMPT)
            .with_temperature(OPTIMIZATION_TEMPERATURE);

        let reply = tokio::time::timeout(self.timeout(), self.generator.generate(&request))
            .await
            .unwrap_or_else(|_| Err(PipeLensError::Timeout(self.analysis.timeout_secs)));

        match reply {
            Ok(reply) => (AiOptimization::from_reply(&reply), true),
            Err(e @ PipeLensError::Timeout(_)) => {
                warn!("AI pipeline analysis skipped: {e}");
                (AiOptimization::unavailable(), false)
            }
            Err(e) => {
                error!("AI pipeline analysis failed: {e}");
                (AiOptimization::unavailable(), false)
            }
        }
    }

    /// Designs a new pipeline for a project.
    pub async fn generate(&self, project: &ProjectDescription) -> Envelope<GenerateAnalysis> {
        info!(
            "Generating pipeline for {} files targeting {}",
            project.codebase_files.len(),
            project.deployment_target
        );

        match self.try_generate(project).await {
            Ok(analysis) => Envelope::success(None, analysis, GENERATOR_AGENT, &self.model),
            Err(e) if e.is_input_error() => {
                warn!("Rejected project description: {e}");
                Envelope::error(None, e.to_string())
            }
            Err(e) => {
                error!("Pipeline generation failed: {e}");
                Envelope::error(None, format!("Failed to generate pipeline: {e}"))
            }
        }
    }

    async fn try_generate(&self, project: &ProjectDescription) -> Result<GenerateAnalysis> {
        if project.codebase_files.is_empty() && project.requirements.is_empty() {
            return Err(PipeLensError::EmptyProject);
        }

        let profile = detect_tech_stack(&project.codebase_files);
        let requirements = Requirements::from_map(&project.requirements);

        let synthesis = SpecificationSynthesizer::new(self.generator.clone(), self.timeout())
            .synthesize(
                &profile,
                &requirements,
                &project.deployment_target,
                &project.team_size,
            )
            .await;
        let spec = synthesis.specification;

        let issues = validate_dependencies(&spec);
        for issue in &issues {
            warn!("Specification issue in job '{}': {}", issue.job, issue.detail);
        }

        let generated_pipelines = render(&spec);
        let metrics = calculate_generation_metrics(&profile, &spec, &self.thresholds);

        Ok(GenerateAnalysis {
            detected_technologies: profile,
            ai_available: synthesis.ai_backed,
            generated_pipelines,
            recommendations: spec.recommendations.clone(),
            best_practices: spec.best_practices.clone(),
            security_considerations: spec.security.clone(),
            performance_optimizations: spec.performance.clone(),
            specification_issues: issues,
            metrics,
            pipeline_specification: spec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockTextGenerator;
    use crate::insights::{PipelineType, Severity, Status};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for Counting {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(MockTextGenerator::respond(&request.prompt))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct Failing;

    #[async_trait]
    impl TextGenerator for Failing {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            Err(PipeLensError::ApiError {
                status: 503,
                message: "unavailable".to_string(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct Slow;

    #[async_trait]
    impl TextGenerator for Slow {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("{}".to_string())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn orchestrator(generator: Arc<dyn TextGenerator>) -> PipelineOrchestrator {
        PipelineOrchestrator::new(generator, AnalysisConfig::default(), "test-model")
    }

    const WORKFLOW: &str = r#"{"jobs": {"build": {"runs-on":"ubuntu-latest","steps":[{"run":"npm install"}]}}, "on":"push"}"#;

    mod optimize {
        use super::*;

        #[tokio::test]
        async fn analyzes_github_workflow() {
            let envelope = orchestrator(Arc::new(MockTextGenerator))
                .optimize("ci.yml", WORKFLOW.as_bytes())
                .await;

            assert!(envelope.is_success());
            assert_eq!(envelope.ai_agent.as_deref(), Some(OPTIMIZER_AGENT));
            assert_eq!(envelope.model_used.as_deref(), Some("test-model"));

            let analysis = envelope.analysis.unwrap();
            assert_eq!(analysis.pipeline_type, PipelineType::GithubActions);
            assert_eq!(analysis.structure.job_count, 1);
            assert_eq!(analysis.structure.step_count, 1);
            assert!(analysis
                .static_analysis
                .patterns
                .iter()
                .any(|p| p.category == "dependency_installation" && p.line == Some(1)));
            assert!(analysis.ai_available);
            assert_eq!(analysis.ai_recommendations[0].title, "AI Analysis Available");
        }

        #[tokio::test]
        async fn malformed_yaml_is_an_error_without_analysis() {
            let envelope = orchestrator(Arc::new(MockTextGenerator))
                .optimize("ci.yml", b"jobs: [unclosed\n  - : :")
                .await;

            assert_eq!(envelope.status, Status::Error);
            assert!(envelope.analysis.is_none());
            assert!(envelope
                .message
                .unwrap()
                .starts_with("YAML parsing error"));
        }

        #[tokio::test]
        async fn oversized_document_is_rejected_before_analysis() {
            let generator = Arc::new(Counting::default());
            let analysis = AnalysisConfig {
                max_document_size: 10,
                ..AnalysisConfig::default()
            };
            let orchestrator = PipelineOrchestrator::new(generator.clone(), analysis, "m");

            let envelope = orchestrator.optimize("ci.yml", WORKFLOW.as_bytes()).await;

            assert_eq!(envelope.status, Status::Error);
            assert!(envelope.message.unwrap().contains("Maximum size: 10"));
            assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        }

        #[tokio::test]
        async fn rejects_empty_input_and_wrong_extension() {
            let orchestrator = orchestrator(Arc::new(MockTextGenerator));

            let empty = orchestrator.optimize("ci.yml", b"").await;
            assert_eq!(empty.message.as_deref(), Some("No file provided"));

            let wrong = orchestrator.optimize("Jenkinsfile", b"pipeline {}").await;
            assert_eq!(wrong.status, Status::Error);
            assert!(wrong.message.unwrap().contains(".yaml or .yml"));

            let upper = orchestrator.optimize("CI.YAML", b"stages: [build]").await;
            assert!(upper.is_success());
        }

        #[tokio::test]
        async fn rejects_non_utf8_content() {
            let envelope = orchestrator(Arc::new(MockTextGenerator))
                .optimize("ci.yml", &[0xff, 0xfe, 0x00])
                .await;
            assert_eq!(
                envelope.message.as_deref(),
                Some("Pipeline file is not valid UTF-8 text")
            );
        }

        #[tokio::test]
        async fn hardcoded_password_is_a_high_finding() {
            let yaml = "env:\n  password: \"hunter2\"\n";
            let analysis = orchestrator(Arc::new(MockTextGenerator))
                .optimize("ci.yml", yaml.as_bytes())
                .await
                .analysis
                .unwrap();

            let concerns = &analysis.static_analysis.security_concerns;
            assert_eq!(concerns.len(), 1);
            assert_eq!(concerns[0].severity, Severity::High);
            assert_eq!(concerns[0].line, Some(2));
            assert_eq!(analysis.metrics.optimization_score, 5.5);
        }

        #[tokio::test]
        async fn ai_failure_keeps_static_results() {
            let envelope = orchestrator(Arc::new(Failing))
                .optimize("ci.yml", WORKFLOW.as_bytes())
                .await;

            assert!(envelope.is_success());
            let analysis = envelope.analysis.unwrap();
            assert!(!analysis.ai_available);
            assert_eq!(
                analysis.summary,
                "AI analysis unavailable - using static analysis only"
            );
            assert!(analysis.ai_recommendations.is_empty());
            assert_eq!(analysis.metrics.jobs_analyzed, 1);
        }

        #[tokio::test]
        async fn ai_timeout_keeps_static_results() {
            let analysis = AnalysisConfig {
                timeout_secs: 0,
                ..AnalysisConfig::default()
            };
            let envelope = PipelineOrchestrator::new(Arc::new(Slow), analysis, "m")
                .optimize("ci.yml", WORKFLOW.as_bytes())
                .await;

            let analysis = envelope.analysis.unwrap();
            assert!(!analysis.ai_available);
            assert_eq!(analysis.structure.job_count, 1);
        }
    }

    mod generate {
        use super::*;

        fn react_project() -> ProjectDescription {
            ProjectDescription {
                codebase_files: vec![
                    "package.json".to_string(),
                    "src/App.jsx".to_string(),
                    "public/index.html".to_string(),
                ],
                deployment_target: "aws".to_string(),
                ..ProjectDescription::default()
            }
        }

        #[tokio::test]
        async fn failing_capability_yields_fallback_pipeline() {
            let envelope = orchestrator(Arc::new(Failing))
                .generate(&react_project())
                .await;

            assert!(envelope.is_success());
            assert!(envelope.filename.is_none());
            assert_eq!(envelope.ai_agent.as_deref(), Some(GENERATOR_AGENT));

            let analysis = envelope.analysis.unwrap();
            assert!(!analysis.ai_available);
            let stages: Vec<_> = analysis
                .pipeline_specification
                .stages
                .iter()
                .map(|s| s.name.as_str())
                .collect();
            assert_eq!(stages, ["Build & Test", "Security & Quality", "Deploy"]);
            assert!(analysis.specification_issues.is_empty());
            assert_eq!(analysis.metrics.total_jobs, 3);
            assert_eq!(analysis.recommendations.len(), 2);
            assert!(analysis.generated_pipelines.contains_key("github-actions"));
            assert!(analysis.generated_pipelines.contains_key("gitlab-ci"));
            assert!(analysis.generated_pipelines["generic"].contains("Security & Quality"));
        }

        #[tokio::test]
        async fn detects_stack_from_file_list() {
            let analysis = orchestrator(Arc::new(MockTextGenerator))
                .generate(&react_project())
                .await
                .analysis
                .unwrap();

            let technologies = &analysis.detected_technologies;
            assert_eq!(technologies.languages[0].name, "React");
            let react = technologies
                .frameworks
                .iter()
                .find(|f| f.name == "react")
                .unwrap();
            assert!(react.confidence >= 0.3);
        }

        #[tokio::test]
        async fn reports_issues_in_generated_specification() {
            struct Cyclic;

            #[async_trait]
            impl TextGenerator for Cyclic {
                async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
                    Ok(r#"{"pipeline_type": "gitlab-ci", "stages": [
                        {"name": "Build", "jobs": [
                            {"name": "a", "dependencies": ["b"]},
                            {"name": "b", "dependencies": ["a", "ghost"]}
                        ]}
                    ]}"#
                    .to_string())
                }

                fn name(&self) -> &str {
                    "cyclic"
                }
            }

            let analysis = orchestrator(Arc::new(Cyclic))
                .generate(&react_project())
                .await
                .analysis
                .unwrap();

            assert!(analysis.ai_available);
            assert_eq!(analysis.specification_issues.len(), 2);
            assert!(!analysis.generated_pipelines.contains_key("github-actions"));
            assert_eq!(analysis.pipeline_specification.stages[0].jobs.len(), 2);
        }

        #[tokio::test]
        async fn empty_project_is_rejected() {
            let envelope = orchestrator(Arc::new(MockTextGenerator))
                .generate(&ProjectDescription::default())
                .await;
            assert_eq!(envelope.status, Status::Error);
            assert_eq!(envelope.message.as_deref(), Some("No project data provided"));
        }

        #[test]
        fn project_description_defaults_missing_fields() {
            let project: ProjectDescription =
                serde_json::from_str(r#"{"codebase_files": ["main.go"]}"#).unwrap();
            assert_eq!(project.deployment_target, "generic");
            assert_eq!(project.team_size, "small");
            assert!(project.requirements.is_empty());
        }
    }
}
