use serde_yaml::{Mapping, Value};

use super::document::key_is;
use crate::insights::PipelineType;

type Rule = fn(&Mapping) -> bool;

/// Classification rules, evaluated in order; the first match wins.
///
/// Jenkins sits after Azure DevOps, so a document with `pipeline` and `stages`
/// is claimed by an earlier rule. The order is fixed and covered by tests.
const RULES: &[(PipelineType, Rule)] = &[
    (PipelineType::GithubActions, is_github_actions),
    (PipelineType::GitlabCi, is_gitlab_ci),
    (PipelineType::AzureDevops, is_azure_devops),
    (PipelineType::Jenkins, is_jenkins),
];

/// Returns the pipeline system a parsed document targets.
///
/// Pure and total: non-mapping roots and empty documents are `Generic`.
pub fn classify(parsed: &Value) -> PipelineType {
    let Some(root) = parsed.as_mapping() else {
        return PipelineType::Generic;
    };

    RULES
        .iter()
        .find(|(_, rule)| rule(root))
        .map_or(PipelineType::Generic, |(pipeline_type, _)| *pipeline_type)
}

fn has_key(root: &Mapping, name: &str) -> bool {
    root.keys().any(|key| key_is(key, name))
}

/// YAML 1.1 loaders read a bare `on` key as boolean true.
fn has_trigger_key(root: &Mapping) -> bool {
    root.keys()
        .any(|key| key_is(key, "on") || matches!(key, Value::Bool(true)))
}

fn is_github_actions(root: &Mapping) -> bool {
    has_key(root, "jobs") && has_trigger_key(root)
}

fn is_gitlab_ci(root: &Mapping) -> bool {
    has_key(root, "stages")
        || root
            .values()
            .any(|value| value.as_mapping().is_some_and(|job| has_key(job, "script")))
}

fn is_azure_devops(root: &Mapping) -> bool {
    has_key(root, "pipeline") || has_key(root, "agent")
}

fn is_jenkins(root: &Mapping) -> bool {
    has_key(root, "pipeline") && has_key(root, "stages")
}
