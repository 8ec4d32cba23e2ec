use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::generation::spec::{
    extract_json, BestPractice, PerformanceOptimization, PipelineSpecification,
    SecurityConsideration, SpecIssue, SpecRecommendation,
};

/// CI/CD system a pipeline document was written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum PipelineType {
    GithubActions,
    GitlabCi,
    AzureDevops,
    Jenkins,
    #[default]
    Generic,
}

impl PipelineType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GithubActions => "github-actions",
            Self::GitlabCi => "gitlab-ci",
            Self::AzureDevops => "azure-devops",
            Self::Jenkins => "jenkins",
            Self::Generic => "generic",
        }
    }
}

impl From<String> for PipelineType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "github-actions" => Self::GithubActions,
            "gitlab-ci" => Self::GitlabCi,
            "azure-devops" => Self::AzureDevops,
            "jenkins" => Self::Jenkins,
            _ => Self::Generic,
        }
    }
}

impl fmt::Display for PipelineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
}

/// Structural facts extracted from a parsed pipeline document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructureAnalysis {
    pub pipeline_type: PipelineType,
    pub job_count: usize,
    pub step_count: usize,
    /// `(from, to)` edges in document order; unresolved names are kept as-is
    pub dependency_edges: Vec<DependencyEdge>,
    /// Job name to runner/image declaration
    pub resource_usage: IndexMap<String, String>,
    pub caching_present: bool,
    pub artifacts_used: bool,
    pub secret_using_jobs: BTreeSet<String>,
    /// Jobs that declare no dependencies at all
    pub independent_jobs: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Info => "info",
        };
        f.write_str(label)
    }
}

/// A single static-analysis observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// 1-indexed source line, absent for structural findings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub category: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    pub description: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticFindings {
    pub security_concerns: Vec<Finding>,
    pub patterns: Vec<Finding>,
    pub best_practices: Vec<Finding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Excellent,
    Good,
    NeedsImprovement,
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::NeedsImprovement => "needs_improvement",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    pub optimization_score: f64,
    /// Percentage string such as `"50%"`
    pub time_savings_potential: String,
    pub complexity: Level,
    pub jobs_analyzed: usize,
    pub steps_analyzed: usize,
    pub security_issues_found: usize,
    pub performance_opportunities: usize,
    pub parallelization_potential: usize,
    pub overall_health: Health,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewMetrics {
    pub overall_score: f64,
    pub security_score: f64,
    pub change_impact: Level,
    pub total_changes: usize,
    pub risk_level: Level,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMetrics {
    pub tech_stack_confidence: f64,
    pub pipeline_complexity: Level,
    pub total_jobs: usize,
    pub total_steps: usize,
    pub estimated_setup_time: String,
    pub maintenance_effort: Level,
    pub recommended_triggers: Vec<String>,
    pub optimization_potential: Level,
    pub security_coverage: usize,
    pub performance_optimizations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageDetection {
    pub name: String,
    pub confidence: f64,
    pub file_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub name: String,
    pub confidence: f64,
    pub matches: usize,
}

/// Technologies inferred from a list of repository paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechStackProfile {
    pub languages: Vec<LanguageDetection>,
    pub frameworks: Vec<Detection>,
    /// Category name (`deployment_tools`, `testing_frameworks`, ...) to detections
    pub tools_by_category: IndexMap<String, Vec<Detection>>,
    pub confidence_score: f64,
}

impl TechStackProfile {
    pub fn tools(&self, category: &str) -> &[Detection] {
        self.tools_by_category
            .get(category)
            .map_or(&[], Vec::as_slice)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiRecommendation {
    pub category: String,
    pub priority: String,
    pub title: String,
    pub description: String,
    pub solution: String,
    pub estimated_impact: String,
    pub complexity: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationOpportunity {
    #[serde(rename = "type")]
    pub kind: String,
    pub current_state: String,
    pub optimized_state: String,
    pub benefit: String,
    pub implementation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceImprovement {
    pub area: String,
    pub current_metric: String,
    pub target_metric: String,
    pub improvement: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityEnhancement {
    pub issue: String,
    pub risk_level: String,
    pub recommendation: String,
    pub implementation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CostOptimization {
    pub area: String,
    pub current_cost_driver: String,
    pub optimization: String,
    pub estimated_savings: String,
}

/// Top-level keys that mark a JSON object as an [`AiOptimization`].
const ANALYSIS_KEYS: [&str; 6] = [
    "summary",
    "recommendations",
    "optimization_opportunities",
    "performance_improvements",
    "security_enhancements",
    "cost_optimizations",
];

/// Qualitative advice returned by the AI capability for an existing pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiOptimization {
    pub summary: String,
    pub recommendations: Vec<AiRecommendation>,
    pub optimization_opportunities: Vec<OptimizationOpportunity>,
    pub performance_improvements: Vec<PerformanceImprovement>,
    pub security_enhancements: Vec<SecurityEnhancement>,
    pub cost_optimizations: Vec<CostOptimization>,
}

impl AiOptimization {
    const EXCERPT_CHARS: usize = 300;

    /// Reads a JSON reply, or wraps prose in a single general recommendation.
    ///
    /// An embedded object only counts as the analysis when it carries at least
    /// one of the analysis keys; any other braces are treated as prose.
    pub fn from_reply(text: &str) -> Self {
        if let Some(parsed) = Self::from_json_reply(text) {
            return parsed;
        }

        let description = if text.chars().count() > Self::EXCERPT_CHARS {
            let excerpt: String = text.chars().take(Self::EXCERPT_CHARS).collect();
            format!("{excerpt}...")
        } else {
            text.to_string()
        };

        Self {
            summary: "AI provided text analysis (see recommendations for details)".to_string(),
            recommendations: vec![AiRecommendation {
                category: "general".to_string(),
                priority: "medium".to_string(),
                title: "AI Analysis Available".to_string(),
                description,
                solution: "Review the full AI analysis for specific recommendations".to_string(),
                estimated_impact: "Variable based on implementation".to_string(),
                complexity: "medium".to_string(),
            }],
            ..Self::default()
        }
    }

    fn from_json_reply(text: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(extract_json(text)?).ok()?;
        let object = value.as_object()?;
        if !ANALYSIS_KEYS.iter().any(|key| object.contains_key(*key)) {
            return None;
        }

        let mut parsed: Self = serde_json::from_value(value).ok()?;
        if parsed.summary.trim().is_empty() {
            parsed.summary = "Pipeline optimization completed".to_string();
        }
        Some(parsed)
    }

    pub fn unavailable() -> Self {
        Self {
            summary: "AI analysis unavailable - using static analysis only".to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeAnalysis {
    pub summary: String,
    pub pipeline_type: PipelineType,
    pub structure: StructureAnalysis,
    pub ai_available: bool,
    pub ai_recommendations: Vec<AiRecommendation>,
    pub optimization_opportunities: Vec<OptimizationOpportunity>,
    pub performance_improvements: Vec<PerformanceImprovement>,
    pub security_enhancements: Vec<SecurityEnhancement>,
    pub cost_optimizations: Vec<CostOptimization>,
    pub static_analysis: StaticFindings,
    pub metrics: OptimizationMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateAnalysis {
    pub detected_technologies: TechStackProfile,
    pub ai_available: bool,
    pub pipeline_specification: PipelineSpecification,
    /// Platform name to rendered document
    pub generated_pipelines: IndexMap<String, String>,
    pub recommendations: Vec<SpecRecommendation>,
    pub best_practices: Vec<BestPractice>,
    pub security_considerations: Vec<SecurityConsideration>,
    pub performance_optimizations: Vec<PerformanceOptimization>,
    pub specification_issues: Vec<SpecIssue>,
    pub metrics: GenerationMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Response envelope shared by the optimize and generate flows.
///
/// An error envelope never carries an analysis block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(filename: Option<String>, analysis: T, agent: &str, model: &str) -> Self {
        Self {
            status: Status::Success,
            filename,
            timestamp: Utc::now(),
            analysis: Some(analysis),
            message: None,
            ai_agent: Some(agent.to_string()),
            model_used: Some(model.to_string()),
        }
    }

    pub fn error(filename: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            filename,
            timestamp: Utc::now(),
            analysis: None,
            message: Some(message.into()),
            ai_agent: None,
            model_used: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_type_round_trips_through_kebab_case() {
        let json = serde_json::to_string(&PipelineType::AzureDevops).unwrap();
        assert_eq!(json, "\"azure-devops\"");
        let parsed: PipelineType = serde_json::from_str("\"gitlab-ci\"").unwrap();
        assert_eq!(parsed, PipelineType::GitlabCi);
    }

    #[test]
    fn unknown_pipeline_type_becomes_generic() {
        let parsed: PipelineType = serde_json::from_str("\"circleci\"").unwrap();
        assert_eq!(parsed, PipelineType::Generic);
    }

    #[test]
    fn error_envelope_omits_analysis() {
        let envelope: Envelope<StructureAnalysis> =
            Envelope::error(Some("ci.yml".to_string()), "boom");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["message"], "boom");
        assert!(value.get("analysis").is_none());
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn ai_reply_json_is_read_leniently() {
        let reply = r#"{"summary": "Fast enough", "optimization_opportunities": [{"type": "caching"}]}"#;
        let advice = AiOptimization::from_reply(reply);
        assert_eq!(advice.summary, "Fast enough");
        assert_eq!(advice.optimization_opportunities[0].kind, "caching");
        assert!(advice.recommendations.is_empty());
    }

    #[test]
    fn ai_json_reply_without_summary_gets_default_summary() {
        let advice = AiOptimization::from_reply(r#"{"recommendations": [{"title": "Cache npm"}]}"#);
        assert_eq!(advice.summary, "Pipeline optimization completed");
        assert_eq!(advice.recommendations[0].title, "Cache npm");
    }

    #[test]
    fn ai_prose_quoting_a_json_snippet_stays_prose() {
        let reply = r#"Add dependency caching, for example {"key": "npm-cache"}, and pin runner versions."#;
        let advice = AiOptimization::from_reply(reply);
        assert_eq!(
            advice.summary,
            "AI provided text analysis (see recommendations for details)"
        );
        assert_eq!(advice.recommendations.len(), 1);
        assert_eq!(advice.recommendations[0].title, "AI Analysis Available");
        assert_eq!(advice.recommendations[0].description, reply);
    }

    #[test]
    fn ai_prose_reply_is_truncated_into_one_recommendation() {
        let reply = "x".repeat(400);
        let advice = AiOptimization::from_reply(&reply);
        assert_eq!(advice.recommendations.len(), 1);
        assert_eq!(advice.recommendations[0].title, "AI Analysis Available");
        assert_eq!(advice.recommendations[0].description.len(), 303);
        assert!(advice.recommendations[0].description.ends_with("..."));

        let short = AiOptimization::from_reply("short note");
        assert_eq!(short.recommendations[0].description, "short note");
    }

    #[test]
    fn missing_tool_category_yields_empty_slice() {
        let profile = TechStackProfile::default();
        assert!(profile.tools("databases").is_empty());
    }
}
