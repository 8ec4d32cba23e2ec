//! Prompt text for the two AI-assisted flows.

use crate::generation::Requirements;
use crate::insights::{StructureAnalysis, TechStackProfile};
use crate::stack::signatures::{DATABASES, DEPLOYMENT_TOOLS};

/// Low temperature keeps optimization advice stable between runs.
pub const OPTIMIZATION_TEMPERATURE: f32 = 0.1;
pub const GENERATION_TEMPERATURE: f32 = 0.2;

pub const OPTIMIZATION_SYSTEM_PROMPT: &str = r#"You are an expert DevOps engineer who optimizes CI/CD pipelines across GitHub Actions, GitLab CI, Jenkins and Azure DevOps. You focus on build performance, cost, security, parallel execution, caching and artifact management.

Analyze the provided pipeline configuration and answer with JSON only, using this structure:
{
    "summary": "Brief summary of the pipeline and optimization potential",
    "recommendations": [
        {"category": "performance|cost|security|maintainability", "priority": "critical|high|medium|low", "title": "...", "description": "...", "solution": "...", "estimated_impact": "...", "complexity": "low|medium|high"}
    ],
    "optimization_opportunities": [
        {"type": "parallelization|caching|resource-optimization|dependency-management", "current_state": "...", "optimized_state": "...", "benefit": "...", "implementation": "..."}
    ],
    "performance_improvements": [
        {"area": "build-time|resource-usage|network|storage", "current_metric": "...", "target_metric": "...", "improvement": "..."}
    ],
    "security_enhancements": [
        {"issue": "...", "risk_level": "critical|high|medium|low", "recommendation": "...", "implementation": "..."}
    ],
    "cost_optimizations": [
        {"area": "compute|storage|network|licensing", "current_cost_driver": "...", "optimization": "...", "estimated_savings": "..."}
    ]
}"#;

pub const GENERATION_SYSTEM_PROMPT: &str = r#"You are an expert DevOps architect who designs CI/CD pipelines for GitHub Actions, GitLab CI, Jenkins and Azure DevOps, deploying to AWS, Azure, GCP or hybrid targets with containers and infrastructure as code.

Design a pipeline for the given technology stack and requirements and answer with JSON only, using this structure:
{
    "name": "Pipeline name",
    "pipeline_type": "github-actions|gitlab-ci|azure-devops|jenkins",
    "stages": [
        {
            "name": "stage name",
            "description": "What this stage does",
            "jobs": [
                {"name": "job-name", "description": "...", "dependencies": ["other-job"], "parallel": true, "steps": ["step 1", "step 2"], "estimated_time": "5 minutes", "resources": {"cpu": "2", "memory": "4GB"}}
            ]
        }
    ],
    "recommendations": [{"category": "performance|security|cost|maintainability", "title": "...", "description": "...", "implementation": "...", "priority": "critical|high|medium|low"}],
    "best_practices": [{"practice": "...", "description": "...", "implementation": "..."}],
    "security": [{"concern": "...", "mitigation": "...", "tools": ["tool"]}],
    "performance": [{"optimization": "...", "benefit": "...", "implementation": "..."}],
    "estimated_metrics": {"total_pipeline_time": "15-20 minutes", "parallel_efficiency": "70%", "cost_per_run": "$0.50", "success_rate": "95%"}
}
Job dependencies must only name jobs from the same or an earlier stage."#;

pub fn optimization_prompt(filename: &str, structure: &StructureAnalysis, document: &str) -> String {
    format!(
        "Please analyze this CI/CD pipeline configuration:\n\n\
         Filename: {filename}\n\
         Pipeline Type: {}\n\
         Jobs: {}\n\
         Steps: {}\n\
         Dependencies: {}\n\
         Caching Present: {}\n\
         Artifacts Used: {}\n\n\
         Pipeline Configuration:\n```yaml\n{document}\n```\n\n\
         Focus on performance bottlenecks and parallelization, resource right-sizing, \
         security improvements, and maintainability.",
        structure.pipeline_type,
        structure.job_count,
        structure.step_count,
        structure.dependency_edges.len(),
        structure.caching_present,
        structure.artifacts_used,
    )
}

fn names<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "Not detected".to_string()
    } else {
        joined
    }
}

pub fn generation_prompt(
    profile: &TechStackProfile,
    requirements: &Requirements,
    deployment_target: &str,
    team_size: &str,
) -> String {
    format!(
        "Design a CI/CD pipeline for the following project:\n\n\
         **Technology Stack:**\n\
         - Languages: {}\n\
         - Frameworks: {}\n\
         - Databases: {}\n\
         - Deployment Tools: {}\n\n\
         **Requirements:**\n\
         - Deployment Target: {deployment_target}\n\
         - Team Size: {team_size}\n\
         - Testing Requirements: {}\n\
         - Security Requirements: {}\n\
         - Performance Requirements: {}\n\
         - Compliance: {}\n\n\
         **Additional Context:**\n\
         - Budget Constraints: {}\n\
         - Deployment Frequency: {}\n\
         - Environment Count: {}\n\n\
         Generate a pipeline specification optimized for this stack, with specific steps and tools.",
        names(profile.languages.iter().map(|l| l.name.as_str())),
        names(profile.frameworks.iter().map(|f| f.name.as_str())),
        names(profile.tools(DATABASES).iter().map(|d| d.name.as_str())),
        names(profile.tools(DEPLOYMENT_TOOLS).iter().map(|d| d.name.as_str())),
        requirements.testing,
        requirements.security,
        requirements.performance,
        requirements.compliance,
        requirements.budget,
        requirements.deployment_frequency,
        requirements.environments,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::detect_tech_stack;

    #[test]
    fn generation_prompt_embeds_profile_and_defaults() {
        let profile = detect_tech_stack(&["package.json", "src/App.jsx", "public/index.html"]);
        let prompt = generation_prompt(&profile, &Requirements::default(), "aws", "small");

        assert!(prompt.contains("Languages: React"));
        assert!(prompt.contains("Databases: Not detected"));
        assert!(prompt.contains("Deployment Target: aws"));
        assert!(prompt.contains("Standard unit and integration tests"));
        assert!(prompt.contains("Dev, Staging, Production"));
    }

    #[test]
    fn optimization_prompt_embeds_structure() {
        let structure = StructureAnalysis {
            job_count: 3,
            step_count: 7,
            ..StructureAnalysis::default()
        };
        let prompt = optimization_prompt("ci.yml", &structure, "jobs: {}");
        assert!(prompt.contains("Filename: ci.yml"));
        assert!(prompt.contains("Jobs: 3"));
        assert!(prompt.contains("Steps: 7"));
        assert!(prompt.contains("Pipeline Type: generic"));
        assert!(prompt.contains("```yaml\njobs: {}\n```"));
    }
}
