use serde_yaml::{Mapping, Value};

use super::classifier::classify;
use super::document::{job_name, referenced_names, value_to_text, PipelineDocument};
use crate::insights::{DependencyEdge, PipelineType, StructureAnalysis};

const SECRET_REFERENCE: &str = "secrets.";

/// Extracts job/step counts, dependency edges and usage flags.
///
/// Every lookup defaults when a key is missing or has an unexpected shape, so
/// any parseable document yields an analysis. Unparsed documents yield an
/// empty `Generic` analysis.
///
/// A `jobs` mapping is walked whatever the classification, so a workflow
/// without a trigger key is reported as `Generic` with its jobs counted.
pub fn analyze_structure(document: &PipelineDocument) -> StructureAnalysis {
    let Some(parsed) = document.parsed.as_ref() else {
        return StructureAnalysis::default();
    };

    let mut analysis = StructureAnalysis {
        pipeline_type: classify(parsed),
        ..StructureAnalysis::default()
    };

    let Some(root) = parsed.as_mapping() else {
        return analysis;
    };

    if let Some(jobs) = root.get("jobs").and_then(Value::as_mapping) {
        analyze_workflow_jobs(jobs, &mut analysis);
    } else if analysis.pipeline_type == PipelineType::GitlabCi {
        analyze_gitlab_jobs(root, &mut analysis);
    }

    analysis
}

fn analyze_workflow_jobs(jobs: &Mapping, analysis: &mut StructureAnalysis) {
    analysis.job_count = jobs.len();

    for (key, config) in jobs {
        let name = job_name(key);
        let Some(config) = config.as_mapping() else {
            continue;
        };

        let steps = config
            .get("steps")
            .and_then(Value::as_sequence)
            .map_or(&[][..], Vec::as_slice);
        analysis.step_count += steps.len();

        record_dependencies(&name, referenced_names(config.get("needs")), analysis);

        if let Some(runner) = config.get("runs-on").and_then(value_to_text) {
            analysis.resource_usage.insert(name.clone(), runner);
        }

        for step in steps {
            scan_step(&name, step, analysis);
        }
    }
}

fn scan_step(job: &str, step: &Value, analysis: &mut StructureAnalysis) {
    let Some(step_map) = step.as_mapping() else {
        return;
    };

    if let Some(uses) = step_map.get("uses").and_then(Value::as_str) {
        let uses = uses.to_lowercase();
        analysis.caching_present |= uses.contains("cache");
        analysis.artifacts_used |= uses.contains("artifact");
    }

    let serialized = serde_yaml::to_string(step).unwrap_or_default();
    if serialized.contains(SECRET_REFERENCE) {
        analysis.secret_using_jobs.insert(job.to_string());
    }
}

fn analyze_gitlab_jobs(root: &Mapping, analysis: &mut StructureAnalysis) {
    if root.contains_key("cache") {
        analysis.caching_present = true;
    }

    for (key, value) in root {
        let Some(config) = value.as_mapping() else {
            continue;
        };
        let Some(script) = config.get("script") else {
            continue;
        };

        let name = job_name(key);
        analysis.job_count += 1;
        analysis.step_count += script.as_sequence().map_or(1, Vec::len);

        let mut deps = referenced_names(config.get("needs"));
        deps.extend(referenced_names(config.get("dependencies")));
        record_dependencies(&name, deps, analysis);

        if let Some(image) = config.get("image").and_then(value_to_text) {
            analysis.resource_usage.insert(name.clone(), image);
        } else if let Some(tags) = config.get("tags").and_then(value_to_text) {
            analysis.resource_usage.insert(name.clone(), tags);
        }

        analysis.caching_present |= config.contains_key("cache");
        analysis.artifacts_used |= config.contains_key("artifacts");
    }
}

fn record_dependencies(job: &str, deps: Vec<String>, analysis: &mut StructureAnalysis) {
    if deps.is_empty() {
        analysis.independent_jobs.push(job.to_string());
        return;
    }

    analysis
        .dependency_edges
        .extend(deps.into_iter().map(|from| DependencyEdge {
            from,
            to: job.to_string(),
        }));
}
