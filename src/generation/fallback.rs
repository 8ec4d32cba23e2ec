//! Deterministic pipeline specification used when the AI capability is
//! unavailable or its reply cannot be interpreted.

use indexmap::IndexMap;

use super::spec::{
    BestPractice, EstimatedMetrics, Job, PerformanceOptimization, PipelineSpecification,
    SecurityConsideration, SpecRecommendation, Stage,
};
use crate::insights::{PipelineType, TechStackProfile};
use crate::stack::signatures::LANGUAGE_ECOSYSTEMS;

const BUILD_STEPS: &[(&str, &[&str])] = &[
    (
        "react",
        &[
            "Checkout code",
            "Setup Node.js",
            "Cache dependencies",
            "Install dependencies",
            "Run tests",
            "Build application",
            "Upload build artifacts",
        ],
    ),
    (
        "node",
        &[
            "Checkout code",
            "Setup Node.js",
            "Cache npm dependencies",
            "Install dependencies",
            "Run tests",
            "Build application",
        ],
    ),
    (
        "python",
        &[
            "Checkout code",
            "Setup Python",
            "Cache pip dependencies",
            "Install dependencies",
            "Run tests with pytest",
            "Generate coverage report",
            "Build package",
        ],
    ),
    (
        "java",
        &[
            "Checkout code",
            "Setup JDK",
            "Cache Maven dependencies",
            "Run tests",
            "Generate test reports",
            "Build JAR",
            "Upload artifacts",
        ],
    ),
    (
        "go",
        &[
            "Checkout code",
            "Setup Go",
            "Cache Go modules",
            "Download dependencies",
            "Run tests",
            "Build binary",
            "Upload binary",
        ],
    ),
];

const GENERIC_BUILD_STEPS: &[&str] = &[
    "Checkout code",
    "Setup build environment",
    "Install dependencies",
    "Run tests",
    "Build application",
];

const DEPLOY_STEPS: &[(&str, &[&str])] = &[
    (
        "aws",
        &[
            "Configure AWS credentials",
            "Build Docker image",
            "Push to ECR",
            "Deploy to ECS/EKS",
            "Run health checks",
            "Update load balancer",
        ],
    ),
    (
        "azure",
        &[
            "Configure Azure credentials",
            "Build Docker image",
            "Push to ACR",
            "Deploy to AKS/Container Instances",
            "Verify deployment",
        ],
    ),
    (
        "gcp",
        &[
            "Configure GCP credentials",
            "Build Docker image",
            "Push to GCR",
            "Deploy to GKE/Cloud Run",
            "Verify deployment",
        ],
    ),
    (
        "heroku",
        &[
            "Setup Heroku CLI",
            "Deploy to Heroku",
            "Run database migrations",
            "Verify deployment",
        ],
    ),
    (
        "vercel",
        &["Install Vercel CLI", "Deploy to Vercel", "Verify deployment"],
    ),
];

const GENERIC_DEPLOY_STEPS: &[&str] = &[
    "Prepare deployment artifacts",
    "Deploy to target environment",
    "Run post-deployment tests",
    "Verify deployment health",
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn lookup<'a>(table: &[(&str, &'a [&'a str])], key: &str) -> Option<&'a [&'a str]> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, steps)| *steps)
}

/// First detected framework, else the ecosystem of the first detected language.
pub fn primary_framework(profile: &TechStackProfile) -> Option<String> {
    if let Some(framework) = profile.frameworks.first() {
        return Some(framework.name.to_lowercase());
    }

    let language = profile.languages.first()?.name.to_lowercase();
    LANGUAGE_ECOSYSTEMS
        .iter()
        .find(|(marker, _)| language.contains(marker))
        .map(|(_, ecosystem)| (*ecosystem).to_string())
}

pub fn build_steps(framework: Option<&str>) -> Vec<String> {
    owned(
        framework
            .and_then(|name| lookup(BUILD_STEPS, name))
            .unwrap_or(GENERIC_BUILD_STEPS),
    )
}

pub fn deployment_steps(target: &str) -> Vec<String> {
    owned(lookup(DEPLOY_STEPS, &target.to_lowercase()).unwrap_or(GENERIC_DEPLOY_STEPS))
}

fn resources(cpu: &str, memory: &str) -> IndexMap<String, serde_json::Value> {
    IndexMap::from([
        ("cpu".to_string(), serde_json::Value::from(cpu)),
        ("memory".to_string(), serde_json::Value::from(memory)),
    ])
}

/// Builds the fixed three-stage specification for `profile` and `deployment_target`.
pub fn fallback_specification(
    profile: &TechStackProfile,
    deployment_target: &str,
) -> PipelineSpecification {
    let framework = primary_framework(profile);

    let test = Job {
        name: "test".to_string(),
        description: "Run unit and integration tests".to_string(),
        dependencies: Vec::new(),
        parallel: false,
        steps: build_steps(framework.as_deref()),
        estimated_time: Some("5-8 minutes".to_string()),
        resources: resources("2", "4GB"),
    };

    let security_scan = Job {
        name: "security-scan".to_string(),
        description: "Run security vulnerability scans".to_string(),
        dependencies: Vec::new(),
        parallel: true,
        steps: owned(&[
            "Dependency vulnerability scan",
            "SAST scanning",
            "License compliance check",
        ]),
        estimated_time: Some("3-5 minutes".to_string()),
        resources: resources("1", "2GB"),
    };

    let deploy = Job {
        name: "deploy".to_string(),
        description: format!("Deploy application to {deployment_target}"),
        dependencies: vec![test.name.clone(), security_scan.name.clone()],
        parallel: false,
        steps: deployment_steps(deployment_target),
        estimated_time: Some("5-10 minutes".to_string()),
        resources: resources("1", "2GB"),
    };

    PipelineSpecification {
        name: None,
        pipeline_type: PipelineType::GithubActions,
        stages: vec![
            Stage {
                name: "Build & Test".to_string(),
                description: "Install dependencies, build, and run tests".to_string(),
                jobs: vec![test],
            },
            Stage {
                name: "Security & Quality".to_string(),
                description: "Security scanning and code quality checks".to_string(),
                jobs: vec![security_scan],
            },
            Stage {
                name: "Deploy".to_string(),
                description: format!("Deploy to {deployment_target}"),
                jobs: vec![deploy],
            },
        ],
        recommendations: vec![
            SpecRecommendation {
                category: "performance".to_string(),
                title: "Add Dependency Caching".to_string(),
                description: "Cache dependencies to reduce build times".to_string(),
                implementation:
                    "Use the CI cache action for node_modules, pip cache and similar directories"
                        .to_string(),
                priority: "high".to_string(),
            },
            SpecRecommendation {
                category: "security".to_string(),
                title: "Implement Secret Management".to_string(),
                description: "Use proper secret management for credentials".to_string(),
                implementation:
                    "Store secrets in the CI secret store and use environment-specific configs"
                        .to_string(),
                priority: "critical".to_string(),
            },
        ],
        best_practices: vec![BestPractice {
            practice: "Parallel Job Execution".to_string(),
            description: "Run independent jobs in parallel to reduce total pipeline time"
                .to_string(),
            implementation: "Structure jobs to minimize dependencies and maximize parallelism"
                .to_string(),
        }],
        security: vec![SecurityConsideration {
            concern: "Dependency vulnerabilities".to_string(),
            mitigation: "Regular dependency scanning and updates".to_string(),
            tools: owned(&["npm audit", "safety", "OWASP dependency check"]),
        }],
        performance: vec![PerformanceOptimization {
            optimization: "Build caching".to_string(),
            benefit: "30-50% reduction in build times".to_string(),
            implementation: "Cache dependencies and build artifacts between runs".to_string(),
        }],
        estimated_metrics: EstimatedMetrics {
            total_pipeline_time: Some("12-20 minutes".to_string()),
            parallel_efficiency: Some("60%".to_string()),
            cost_per_run: Some("$0.30".to_string()),
            success_rate: Some("90%".to_string()),
        },
    }
}
