use crate::generation::spec::PipelineSpecification;
use crate::insights::{
    GenerationMetrics, Health, Level, OptimizationMetrics, ReviewMetrics, StaticFindings,
    StructureAnalysis, TechStackProfile,
};
use crate::stack::signatures::DATABASES;

use super::scanner::DEPENDENCY_INSTALLATION;

/// Scoring constants shared by the metric calculators.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub base_score: f64,
    pub score_floor: f64,
    pub security_penalty: f64,
    pub caching_penalty: f64,
    pub critical_penalty: f64,
    pub high_penalty: f64,

    pub caching_savings: u32,
    pub artifact_savings: u32,
    pub max_savings: u32,

    /// Jobs above this count make a pipeline at least medium complexity
    pub medium_jobs: usize,
    pub medium_dependencies: usize,
    pub high_jobs: usize,
    pub high_dependencies: usize,

    pub excellent_score: f64,
    pub good_score: f64,

    pub medium_change_lines: usize,
    pub high_change_lines: usize,

    pub medium_generation_complexity: f64,
    pub high_generation_complexity: f64,
    pub high_optimization_potential: f64,
    pub medium_maintenance_jobs: usize,
    pub high_maintenance_jobs: usize,
    pub min_setup_minutes: usize,
}

impl Thresholds {
    pub const DEFAULT: Self = Self {
        base_score: 7.0,
        score_floor: 1.0,
        security_penalty: 1.5,
        caching_penalty: 0.5,
        critical_penalty: 2.0,
        high_penalty: 1.0,

        caching_savings: 30,
        artifact_savings: 20,
        max_savings: 70,

        medium_jobs: 5,
        medium_dependencies: 3,
        high_jobs: 10,
        high_dependencies: 8,

        excellent_score: 8.5,
        good_score: 7.0,

        medium_change_lines: 50,
        high_change_lines: 200,

        medium_generation_complexity: 5.0,
        high_generation_complexity: 10.0,
        high_optimization_potential: 8.0,
        medium_maintenance_jobs: 5,
        high_maintenance_jobs: 10,
        min_setup_minutes: 30,
    };
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Scores an existing pipeline from its structure and static findings.
pub fn calculate_optimization_metrics(
    structure: &StructureAnalysis,
    findings: &StaticFindings,
    thresholds: &Thresholds,
) -> OptimizationMetrics {
    let security_issues = findings.security_concerns.len();
    let performance_issues = findings
        .patterns
        .iter()
        .filter(|p| p.category == DEPENDENCY_INSTALLATION)
        .count();

    #[allow(clippy::cast_precision_loss)]
    let score = (thresholds.base_score
        - security_issues as f64 * thresholds.security_penalty
        - performance_issues as f64 * thresholds.caching_penalty)
        .max(thresholds.score_floor);

    let jobs = structure.job_count;
    let mut savings = 0;
    if !structure.caching_present && jobs > 0 {
        savings += thresholds.caching_savings;
    }
    if !structure.artifacts_used && jobs > 1 {
        savings += thresholds.artifact_savings;
    }
    let savings = savings.min(thresholds.max_savings);

    let parallelizable = structure.independent_jobs.len();

    OptimizationMetrics {
        optimization_score: round1(score),
        time_savings_potential: format!("{savings}%"),
        complexity: pipeline_complexity(jobs, structure.dependency_edges.len(), thresholds),
        jobs_analyzed: jobs,
        steps_analyzed: structure.step_count,
        security_issues_found: security_issues,
        performance_opportunities: performance_issues,
        parallelization_potential: if parallelizable > 1 { parallelizable } else { 0 },
        overall_health: health(score, thresholds),
    }
}

fn pipeline_complexity(jobs: usize, dependencies: usize, thresholds: &Thresholds) -> Level {
    if jobs > thresholds.high_jobs || dependencies > thresholds.high_dependencies {
        Level::High
    } else if jobs > thresholds.medium_jobs || dependencies > thresholds.medium_dependencies {
        Level::Medium
    } else {
        Level::Low
    }
}

fn health(score: f64, thresholds: &Thresholds) -> Health {
    if score >= thresholds.excellent_score {
        Health::Excellent
    } else if score >= thresholds.good_score {
        Health::Good
    } else {
        Health::NeedsImprovement
    }
}

/// Scores a code review from its critical/high finding counts.
///
/// `base_score` defaults to the standard base when the reviewer supplied none.
pub fn calculate_review_metrics(
    critical: usize,
    high: usize,
    total_changes: usize,
    base_score: Option<f64>,
    thresholds: &Thresholds,
) -> ReviewMetrics {
    let base = base_score.unwrap_or(thresholds.base_score);

    #[allow(clippy::cast_precision_loss)]
    let (critical_f, high_f) = (critical as f64, high as f64);

    let score = (base
        - critical_f * thresholds.critical_penalty
        - high_f * thresholds.high_penalty)
        .max(thresholds.score_floor);
    let security_score = (10.0 - critical_f * 3.0 - high_f * 1.5).max(thresholds.score_floor);

    let change_impact = if total_changes < thresholds.medium_change_lines {
        Level::Low
    } else if total_changes < thresholds.high_change_lines {
        Level::Medium
    } else {
        Level::High
    };

    let risk_level = if critical > 0 {
        Level::High
    } else if high > 0 {
        Level::Medium
    } else {
        Level::Low
    };

    ReviewMetrics {
        overall_score: round1(score),
        security_score: round1(security_score),
        change_impact,
        total_changes,
        risk_level,
    }
}

/// Summarizes a synthesized specification against the detected stack.
pub fn calculate_generation_metrics(
    profile: &TechStackProfile,
    spec: &PipelineSpecification,
    thresholds: &Thresholds,
) -> GenerationMetrics {
    let total_jobs = spec.jobs().count();
    let total_steps: usize = spec.jobs().map(|job| job.steps.len()).sum();

    #[allow(clippy::cast_precision_loss)]
    let complexity_score = profile.languages.len() as f64
        + profile.frameworks.len() as f64 * 2.0
        + profile.tools(DATABASES).len() as f64 * 1.5
        + total_jobs as f64 * 0.5;

    let pipeline_complexity = if complexity_score < thresholds.medium_generation_complexity {
        Level::Low
    } else if complexity_score < thresholds.high_generation_complexity {
        Level::Medium
    } else {
        Level::High
    };

    let maintenance_effort = if total_jobs < thresholds.medium_maintenance_jobs {
        Level::Low
    } else if total_jobs < thresholds.high_maintenance_jobs {
        Level::Medium
    } else {
        Level::High
    };

    GenerationMetrics {
        tech_stack_confidence: profile.confidence_score,
        pipeline_complexity,
        total_jobs,
        total_steps,
        estimated_setup_time: format!(
            "{} minutes",
            thresholds.min_setup_minutes.max(total_steps * 2)
        ),
        maintenance_effort,
        recommended_triggers: ["push to main", "pull request", "scheduled"]
            .into_iter()
            .map(str::to_string)
            .collect(),
        optimization_potential: if complexity_score > thresholds.high_optimization_potential {
            Level::High
        } else {
            Level::Medium
        },
        security_coverage: spec.security.len(),
        performance_optimizations: spec.performance.len(),
    }
}
