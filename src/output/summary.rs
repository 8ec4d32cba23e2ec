use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};
use indexmap::IndexMap;

use super::styling::{availability, bright, bright_red, bright_yellow, cyan, dim, health, status};
use super::tables::{
    color_coded_confidence_cell, color_coded_score_cell, create_table, cyan_header, level_cell,
    severity_cell,
};
use crate::insights::{
    Envelope, Finding, GenerateAnalysis, OptimizeAnalysis, ReviewMetrics, TechStackProfile,
};

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn add_error(output: &mut String, label: &str, message: Option<&str>) {
    let _ = writeln!(
        output,
        "{} {} {}\n",
        bright_red("✗"),
        cyan(label),
        bright_red(message.unwrap_or("Unknown error"))
    );
}

fn push_findings(table: &mut comfy_table::Table, section: &str, findings: &[Finding]) {
    for finding in findings {
        table.add_row(vec![
            Cell::new(finding.line.map_or_else(|| "-".to_string(), |l| l.to_string())),
            severity_cell(finding.severity),
            Cell::new(section),
            Cell::new(&finding.description),
            Cell::new(&finding.recommendation),
        ]);
    }
}

/// Prints one optimize envelope as an overview plus findings tables.
pub fn print_optimize_summary(envelope: &Envelope<OptimizeAnalysis>) {
    println!("{}", render_optimize_summary(envelope));
}

#[allow(clippy::format_push_string)]
pub fn render_optimize_summary(envelope: &Envelope<OptimizeAnalysis>) -> String {
    let mut output = String::new();
    let filename = envelope.filename.as_deref().unwrap_or("pipeline");

    let Some(analysis) = envelope.analysis.as_ref() else {
        add_error(&mut output, filename, envelope.message.as_deref());
        return output;
    };

    add_section_header(&mut output, "📄", filename);

    let metrics = &analysis.metrics;
    output.push_str(&format!(
        "  {} {}\n  {} {}\n  {} {} jobs, {} steps, {} dependencies\n  {} {} ({})\n  {} {}\n  {} {}\n  {} {}\n\n",
        dim("Status:"),
        status(envelope.status),
        dim("Pipeline type:"),
        cyan(analysis.pipeline_type),
        dim("Structure:"),
        bright_yellow(metrics.jobs_analyzed),
        bright_yellow(metrics.steps_analyzed),
        bright_yellow(analysis.structure.dependency_edges.len()),
        dim("Optimization score:"),
        bright_yellow(metrics.optimization_score),
        health(metrics.overall_health),
        dim("Time savings potential:"),
        bright_yellow(&metrics.time_savings_potential),
        dim("Complexity:"),
        bright_yellow(metrics.complexity),
        dim("AI analysis:"),
        availability(analysis.ai_available),
    ));

    if !analysis.summary.is_empty() {
        output.push_str(&format!("  {}\n\n", analysis.summary));
    }

    let findings = &analysis.static_analysis;
    if findings.security_concerns.is_empty()
        && findings.patterns.is_empty()
        && findings.best_practices.is_empty()
    {
        output.push_str(&format!("  {}\n\n", dim("No static findings.")));
    } else {
        add_section_header(&mut output, "🔎", "Static Findings");
        let mut table = create_table();
        table.set_header(cyan_header(&[
            "Line",
            "Severity",
            "Kind",
            "Description",
            "Recommendation",
        ]));
        push_findings(&mut table, "security", &findings.security_concerns);
        push_findings(&mut table, "pattern", &findings.patterns);
        push_findings(&mut table, "best practice", &findings.best_practices);
        output.push_str(&format!("{table}\n\n"));
    }

    if !analysis.ai_recommendations.is_empty() {
        add_section_header(&mut output, "💡", "AI Recommendations");
        let mut table = create_table();
        table.set_header(cyan_header(&["Priority", "Category", "Title", "Description"]));
        for recommendation in &analysis.ai_recommendations {
            table.add_row(vec![
                Cell::new(&recommendation.priority),
                Cell::new(&recommendation.category),
                Cell::new(&recommendation.title),
                Cell::new(&recommendation.description),
            ]);
        }
        output.push_str(&format!("{table}\n\n"));
    }

    output
}

/// Prints a generate envelope: detected stack, designed stages and the
/// rendered documents.
pub fn print_generate_summary(envelope: &Envelope<GenerateAnalysis>) {
    println!("{}", render_generate_summary(envelope));
}

#[allow(clippy::format_push_string)]
pub fn render_generate_summary(envelope: &Envelope<GenerateAnalysis>) -> String {
    let mut output = String::new();

    let Some(analysis) = envelope.analysis.as_ref() else {
        add_error(&mut output, "generate", envelope.message.as_deref());
        return output;
    };

    output.push_str(&render_stack(&analysis.detected_technologies));

    let spec = &analysis.pipeline_specification;
    add_section_header(
        &mut output,
        "🏗️",
        spec.name.as_deref().unwrap_or("Pipeline Specification"),
    );

    let metrics = &analysis.metrics;
    output.push_str(&format!(
        "  {} {}\n  {} {}\n  {} {} jobs, {} steps\n  {} {}\n  {} {}\n\n",
        dim("Pipeline type:"),
        cyan(spec.pipeline_type),
        dim("AI design:"),
        availability(analysis.ai_available),
        dim("Size:"),
        bright_yellow(metrics.total_jobs),
        bright_yellow(metrics.total_steps),
        dim("Estimated setup time:"),
        bright_yellow(&metrics.estimated_setup_time),
        dim("Recommended triggers:"),
        metrics.recommended_triggers.join(", "),
    ));

    let mut table = create_table();
    table.set_header(cyan_header(&["Stage", "Job", "Depends On", "Steps", "Estimate"]));
    for stage in &spec.stages {
        for job in &stage.jobs {
            let depends_on = if job.dependencies.is_empty() {
                "-".to_string()
            } else {
                job.dependencies.join(", ")
            };
            table.add_row(vec![
                Cell::new(&stage.name),
                Cell::new(&job.name),
                Cell::new(depends_on),
                Cell::new(job.steps.len()),
                Cell::new(job.estimated_time.as_deref().unwrap_or("-")),
            ]);
        }
    }
    output.push_str(&format!("{table}\n\n"));

    let mut levels = create_table();
    levels.set_header(cyan_header(&["Complexity", "Maintenance", "Optimization Potential"]));
    levels.add_row(vec![
        level_cell(metrics.pipeline_complexity),
        level_cell(metrics.maintenance_effort),
        level_cell(metrics.optimization_potential),
    ]);
    output.push_str(&format!("{levels}\n\n"));

    if !analysis.specification_issues.is_empty() {
        add_section_header(&mut output, "⚠️", "Specification Issues");
        for issue in &analysis.specification_issues {
            output.push_str(&format!(
                "  {} {}: {}\n",
                bright_yellow("•"),
                cyan(&issue.job),
                issue.detail
            ));
        }
        output.push('\n');
    }

    if !analysis.recommendations.is_empty() {
        add_section_header(&mut output, "💡", "Recommendations");
        for recommendation in &analysis.recommendations {
            output.push_str(&format!(
                "  {} [{}] {}: {}\n",
                cyan("•"),
                recommendation.priority,
                bright(&recommendation.title),
                recommendation.description
            ));
        }
        output.push('\n');
    }

    output.push_str(&render_documents(&analysis.generated_pipelines));
    output
}

/// Renders detected languages, frameworks and tools.
#[allow(clippy::format_push_string)]
pub fn render_stack(profile: &TechStackProfile) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🧪", "Detected Technologies");

    let mut table = create_table();
    table.set_header(cyan_header(&["Kind", "Name", "Confidence", "Matches"]));

    for language in &profile.languages {
        table.add_row(vec![
            Cell::new("language"),
            Cell::new(&language.name),
            color_coded_confidence_cell(language.confidence),
            Cell::new(format!("{} files", language.file_count)),
        ]);
    }
    for framework in &profile.frameworks {
        table.add_row(vec![
            Cell::new("framework"),
            Cell::new(&framework.name),
            color_coded_confidence_cell(framework.confidence),
            Cell::new(framework.matches),
        ]);
    }
    for (category, tools) in &profile.tools_by_category {
        for tool in tools {
            table.add_row(vec![
                Cell::new(category.replace('_', " ")),
                Cell::new(&tool.name),
                color_coded_confidence_cell(tool.confidence),
                Cell::new(tool.matches),
            ]);
        }
    }

    if table.row_iter().next().is_none() {
        table.add_row(vec![
            Cell::new("-").fg(TableColor::DarkGrey),
            Cell::new("Nothing detected").fg(TableColor::DarkGrey),
            Cell::new(""),
            Cell::new(""),
        ]);
    }

    output.push_str(&format!(
        "{table}\n  {} {}\n\n",
        dim("Stack confidence:"),
        color_coded_confidence_cell(profile.confidence_score).content()
    ));
    output
}

/// Renders generated documents one after another under their platform name.
#[allow(clippy::format_push_string)]
pub fn render_documents(documents: &IndexMap<String, String>) -> String {
    let mut output = String::new();
    for (platform, document) in documents {
        add_section_header(&mut output, "📦", platform);
        output.push_str(document.trim_end());
        output.push_str("\n\n");
    }
    output
}

/// Renders review-style scores.
pub fn render_review(metrics: &ReviewMetrics) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "📝", "Review Score");

    let mut table = create_table();
    table.set_header(cyan_header(&["Overall", "Security", "Risk", "Change Impact", "Changes"]));
    table.add_row(vec![
        color_coded_score_cell(metrics.overall_score),
        color_coded_score_cell(metrics.security_score),
        level_cell(metrics.risk_level),
        level_cell(metrics.change_impact),
        Cell::new(metrics.total_changes),
    ]);

    let _ = writeln!(output, "{table}\n");
    output
}

pub fn print_review(metrics: &ReviewMetrics) {
    println!("{}", render_review(metrics));
}

pub fn print_stack(profile: &TechStackProfile) {
    println!("{}", render_stack(profile));
}

pub fn print_documents(documents: &IndexMap<String, String>) {
    println!("{}", render_documents(documents));
}

/// One row per optimized file, printed before the per-file details when
/// several files were analyzed.
pub fn render_optimize_overview(envelopes: &[Envelope<OptimizeAnalysis>]) -> String {
    let mut table = create_table();
    table.set_header(cyan_header(&["File", "Type", "Score", "Savings", "Findings"]));

    for envelope in envelopes {
        let filename = envelope.filename.as_deref().unwrap_or("pipeline");
        match envelope.analysis.as_ref() {
            Some(analysis) => {
                let findings = &analysis.static_analysis;
                table.add_row(vec![
                    Cell::new(filename),
                    Cell::new(analysis.pipeline_type),
                    color_coded_score_cell(analysis.metrics.optimization_score),
                    Cell::new(&analysis.metrics.time_savings_potential),
                    Cell::new(
                        findings.security_concerns.len()
                            + findings.patterns.len()
                            + findings.best_practices.len(),
                    ),
                ]);
            }
            None => {
                table.add_row(vec![
                    Cell::new(filename),
                    Cell::new("error").fg(TableColor::Red),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                ]);
            }
        }
    }

    let mut output = String::new();
    add_section_header(&mut output, "📊", "Overview");
    let _ = writeln!(output, "{table}\n");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockTextGenerator;
    use crate::config::AnalysisConfig;
    use crate::orchestrator::{PipelineOrchestrator, ProjectDescription};
    use crate::pipeline::{calculate_review_metrics, Thresholds};
    use crate::stack::detect_tech_stack;
    use std::sync::Arc;

    fn orchestrator() -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            Arc::new(MockTextGenerator),
            AnalysisConfig::default(),
            "mock",
        )
    }

    #[tokio::test]
    async fn optimize_summary_lists_findings() {
        let yaml = "on: push\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps:\n      - run: npm install\n";
        let envelope = orchestrator().optimize("ci.yml", yaml.as_bytes()).await;
        let summary = render_optimize_summary(&envelope);

        assert!(summary.contains("ci.yml"));
        assert!(summary.contains("github-actions"));
        assert!(summary.contains("Static Findings"));
        assert!(summary.contains("pattern"));
        assert!(summary.contains("AI Recommendations"));
    }

    #[tokio::test]
    async fn overview_has_a_row_per_file() {
        let orchestrator = orchestrator();
        let envelopes = vec![
            orchestrator.optimize("a.yml", b"stages: [build]").await,
            orchestrator.optimize("b.json", b"{}").await,
        ];
        let overview = render_optimize_overview(&envelopes);
        assert!(overview.contains("a.yml"));
        assert!(overview.contains("gitlab-ci"));
        assert!(overview.contains("b.json"));
        assert!(overview.contains("error"));
    }

    #[tokio::test]
    async fn error_envelope_prints_message_only() {
        let envelope = orchestrator().optimize("ci.txt", b"jobs: {}").await;
        let summary = render_optimize_summary(&envelope);
        assert!(summary.contains("ci.txt"));
        assert!(summary.contains(".yaml or .yml"));
        assert!(!summary.contains("Static Findings"));
    }

    #[tokio::test]
    async fn generate_summary_shows_stages_and_documents() {
        let project = ProjectDescription {
            codebase_files: vec!["requirements.txt".to_string(), "app.py".to_string()],
            ..ProjectDescription::default()
        };
        let envelope = orchestrator().generate(&project).await;
        let summary = render_generate_summary(&envelope);

        assert!(summary.contains("Detected Technologies"));
        assert!(summary.contains("flask"));
        assert!(summary.contains("Security & Quality"));
        assert!(summary.contains("security-scan"));
        assert!(summary.contains("gitlab-ci"));
        assert!(summary.contains("# Generic CI/CD Pipeline Specification"));
    }

    #[test]
    fn empty_stack_says_nothing_detected() {
        let summary = render_stack(&detect_tech_stack::<&str>(&[]));
        assert!(summary.contains("Nothing detected"));
        assert!(summary.contains("0%"));
    }

    #[test]
    fn review_summary_shows_risk() {
        let metrics = calculate_review_metrics(1, 0, 80, None, &Thresholds::DEFAULT);
        let summary = render_review(&metrics);
        assert!(summary.contains("Review Score"));
        assert!(summary.contains("5.0"));
        assert!(summary.contains("high"));
    }
}
