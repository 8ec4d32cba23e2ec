use serde_yaml::Value;

use super::document::{job_name, key_is, PipelineDocument};
use crate::insights::{Finding, Severity, StaticFindings};

const CREDENTIAL_KEYS: [&str; 4] = ["password:", "secret:", "token:", "key:"];
const SECRET_MARKERS: [&str; 4] = ["${{", "secrets.", "vault:", "env."];
const INSTALL_COMMANDS: [&str; 2] = ["npm install", "pip install"];
const FLOATING_RUNNERS: [&str; 1] = ["ubuntu-latest"];

pub const DEPENDENCY_INSTALLATION: &str = "dependency_installation";
pub const GENERIC_RUNNER: &str = "generic_runner";
pub const HARDCODED_CREDENTIAL: &str = "hardcoded_credential";
pub const PARALLELIZATION: &str = "parallelization";

/// Line-oriented heuristic scan of a pipeline document.
///
/// Line rules run on the raw text and work even when the document failed to
/// parse. The structural parallelization check only runs on parsed documents
/// with a `jobs` mapping.
pub fn scan(document: &PipelineDocument) -> StaticFindings {
    let mut findings = StaticFindings::default();

    for (index, line) in document.raw_text.lines().enumerate() {
        scan_line(index + 1, line, &mut findings);
    }

    if let Some(finding) = document.root_mapping().and_then(parallelization_finding) {
        findings.best_practices.push(finding);
    }

    findings
}

fn scan_line(number: usize, line: &str, findings: &mut StaticFindings) {
    let lower = line.trim().to_lowercase();

    let mentions_credential = CREDENTIAL_KEYS.iter().any(|key| lower.contains(key));
    let assigns = line.contains('=') || line.contains(':');
    let references_secret = SECRET_MARKERS.iter().any(|marker| lower.contains(marker));
    if mentions_credential && assigns && !references_secret {
        findings.security_concerns.push(Finding {
            line: Some(number),
            category: HARDCODED_CREDENTIAL.to_string(),
            severity: Severity::High,
            impact: None,
            description: "Potential hardcoded credential".to_string(),
            recommendation: "Use secrets management or environment variables".to_string(),
        });
    }

    if INSTALL_COMMANDS.iter().any(|cmd| lower.contains(cmd)) {
        findings.patterns.push(Finding {
            line: Some(number),
            category: DEPENDENCY_INSTALLATION.to_string(),
            severity: Severity::Info,
            impact: None,
            description: "Dependencies are installed on every run".to_string(),
            recommendation: "Consider using dependency caching to speed up builds".to_string(),
        });
    }

    if FLOATING_RUNNERS.iter().any(|runner| lower.contains(runner)) {
        findings.patterns.push(Finding {
            line: Some(number),
            category: GENERIC_RUNNER.to_string(),
            severity: Severity::Info,
            impact: None,
            description: "Job runs on a floating runner image".to_string(),
            recommendation: "Consider using specific runner versions for consistency".to_string(),
        });
    }
}

fn parallelization_finding(root: &serde_yaml::Mapping) -> Option<Finding> {
    let jobs = root.get("jobs").and_then(Value::as_mapping)?;

    let independent: Vec<String> = jobs
        .iter()
        .filter_map(|(name, config)| {
            let config = config.as_mapping()?;
            let has_deps = config.iter().any(|(key, value)| {
                (key_is(key, "needs") || key_is(key, "dependencies")) && !is_empty_value(value)
            });
            if has_deps {
                return None;
            }
            Some(job_name(name))
        })
        .collect();

    (independent.len() > 1).then(|| Finding {
        line: None,
        category: PARALLELIZATION.to_string(),
        severity: Severity::Low,
        impact: Some("Could reduce overall pipeline execution time".to_string()),
        description: format!(
            "Consider parallelizing independent jobs: {}",
            independent.join(", ")
        ),
        recommendation: "Run jobs without dependencies concurrently".to_string(),
    })
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        Value::Bool(b) => !b,
        Value::Number(_) | Value::Tagged(_) => false,
    }
}
