use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{PipeLensError, Result};
use crate::insights::PipelineType;

/// A multi-stage pipeline design, either synthesized locally or returned by
/// the AI capability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSpecification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub pipeline_type: PipelineType,
    pub stages: Vec<Stage>,
    pub recommendations: Vec<SpecRecommendation>,
    pub best_practices: Vec<BestPractice>,
    pub security: Vec<SecurityConsideration>,
    pub performance: Vec<PerformanceOptimization>,
    pub estimated_metrics: EstimatedMetrics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Stage {
    pub name: String,
    pub description: String,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub name: String,
    pub description: String,
    /// Names of jobs that must finish first
    pub dependencies: Vec<String>,
    pub parallel: bool,
    pub steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    /// Free-form resource hints such as `cpu` and `memory`
    pub resources: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecRecommendation {
    pub category: String,
    pub title: String,
    pub description: String,
    pub implementation: String,
    pub priority: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BestPractice {
    pub practice: String,
    pub description: String,
    pub implementation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConsideration {
    pub concern: String,
    pub mitigation: String,
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceOptimization {
    pub optimization: String,
    pub benefit: String,
    pub implementation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatedMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pipeline_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_efficiency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_run: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<String>,
}

impl PipelineSpecification {
    /// Every job across all stages, in stage order.
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.stages.iter().flat_map(|stage| stage.jobs.iter())
    }

    /// Interprets free-form generated text as a specification.
    ///
    /// The JSON object may be wrapped in prose or a fenced code block.
    ///
    /// # Errors
    ///
    /// Returns an error if the text holds no JSON object, the object does not
    /// match the specification shape, or it defines no stages.
    pub fn from_reply(text: &str) -> Result<Self> {
        let json = extract_json(text)
            .ok_or_else(|| PipeLensError::Ai("Response contained no JSON object".to_string()))?;
        let spec: Self = serde_json::from_str(json)?;
        if spec.stages.is_empty() {
            return Err(PipeLensError::Ai(
                "Generated specification defines no stages".to_string(),
            ));
        }
        Ok(spec)
    }
}

/// Slice from the first `{` to the last `}` of `text`, if both exist.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DuplicateJob,
    UnresolvedDependency,
    ForwardReference,
    DependencyCycle,
}

/// Advisory problem found in a specification's job graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecIssue {
    pub kind: IssueKind,
    pub job: String,
    pub detail: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Reports dependency problems without changing the specification.
///
/// A dependency must name a job in the same or an earlier stage. Cycles are
/// reported once each, starting from the first job on the cycle in stage
/// order.
pub fn validate_dependencies(spec: &PipelineSpecification) -> Vec<SpecIssue> {
    let mut issues = Vec::new();

    let mut stage_of: HashMap<&str, usize> = HashMap::new();
    for (index, stage) in spec.stages.iter().enumerate() {
        for job in &stage.jobs {
            if stage_of.contains_key(job.name.as_str()) {
                issues.push(SpecIssue {
                    kind: IssueKind::DuplicateJob,
                    job: job.name.clone(),
                    detail: format!("Job '{}' is defined more than once", job.name),
                });
            } else {
                stage_of.insert(&job.name, index);
            }
        }
    }

    let mut graph: IndexMap<&str, Vec<&str>> = IndexMap::new();
    for (index, stage) in spec.stages.iter().enumerate() {
        for job in &stage.jobs {
            let edges = graph.entry(job.name.as_str()).or_default();
            for dependency in &job.dependencies {
                match stage_of.get(dependency.as_str()) {
                    None => issues.push(SpecIssue {
                        kind: IssueKind::UnresolvedDependency,
                        job: job.name.clone(),
                        detail: format!("Depends on unknown job '{dependency}'"),
                    }),
                    Some(&dep_stage) => {
                        if dep_stage > index {
                            issues.push(SpecIssue {
                                kind: IssueKind::ForwardReference,
                                job: job.name.clone(),
                                detail: format!(
                                    "Depends on '{dependency}' from a later stage ({})",
                                    spec.stages[dep_stage].name
                                ),
                            });
                        }
                        edges.push(dependency.as_str());
                    }
                }
            }
        }
    }

    let mut marks = HashMap::new();
    let mut path = Vec::new();
    for &job in graph.keys() {
        if !marks.contains_key(job) {
            visit(job, &graph, &mut marks, &mut path, &mut issues);
        }
    }

    issues
}

fn visit<'a>(
    job: &'a str,
    graph: &IndexMap<&'a str, Vec<&'a str>>,
    marks: &mut HashMap<&'a str, Mark>,
    path: &mut Vec<&'a str>,
    issues: &mut Vec<SpecIssue>,
) {
    marks.insert(job, Mark::Visiting);
    path.push(job);

    for &next in graph.get(job).into_iter().flatten() {
        match marks.get(next) {
            Some(Mark::Visiting) => {
                if let Some(start) = path.iter().position(|name| *name == next) {
                    let mut cycle = path[start..].to_vec();
                    cycle.push(next);
                    issues.push(SpecIssue {
                        kind: IssueKind::DependencyCycle,
                        job: next.to_string(),
                        detail: format!("Dependency cycle: {}", cycle.join(" -> ")),
                    });
                }
            }
            Some(Mark::Done) => {}
            None => visit(next, graph, marks, path, issues),
        }
    }

    path.pop();
    marks.insert(job, Mark::Done);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(name: &str, dependencies: &[&str]) -> Job {
        Job {
            name: name.to_string(),
            dependencies: dependencies.iter().map(|d| (*d).to_string()).collect(),
            ..Job::default()
        }
    }

    fn spec(stages: Vec<Vec<Job>>) -> PipelineSpecification {
        PipelineSpecification {
            stages: stages
                .into_iter()
                .enumerate()
                .map(|(i, jobs)| Stage {
                    name: format!("stage {i}"),
                    description: String::new(),
                    jobs,
                })
                .collect(),
            ..PipelineSpecification::default()
        }
    }

    mod parsing {
        use super::*;

        #[test]
        fn extracts_json_from_fenced_reply() {
            let reply = "Here you go:\n```json\n{\"a\": {\"b\": 1}}\n```\nEnjoy";
            assert_eq!(extract_json(reply), Some("{\"a\": {\"b\": 1}}"));
            assert_eq!(extract_json("no braces here"), None);
            assert_eq!(extract_json("} backwards {"), None);
        }

        #[test]
        fn parses_reply_with_partial_fields() {
            let reply = r#"{
                "pipeline_type": "gitlab-ci",
                "stages": [{"name": "Build", "jobs": [{"name": "compile", "steps": ["make"], "resources": {"cpu": 2}}]}]
            }"#;
            let spec = PipelineSpecification::from_reply(reply).unwrap();
            assert_eq!(spec.pipeline_type, PipelineType::GitlabCi);
            assert_eq!(spec.jobs().count(), 1);
            assert_eq!(spec.stages[0].jobs[0].resources["cpu"], 2);
            assert!(spec.name.is_none());
        }

        #[test]
        fn rejects_reply_without_stages() {
            assert!(PipelineSpecification::from_reply(r#"{"summary": "nope"}"#).is_err());
            assert!(PipelineSpecification::from_reply("**Recommendations:** cache").is_err());
        }

        #[test]
        fn jobs_iterates_across_stages_in_order() {
            let spec = spec(vec![vec![job("a", &[]), job("b", &[])], vec![job("c", &[])]]);
            let names: Vec<_> = spec.jobs().map(|j| j.name.as_str()).collect();
            assert_eq!(names, ["a", "b", "c"]);
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn well_formed_spec_has_no_issues() {
            let spec = spec(vec![
                vec![job("test", &[])],
                vec![job("scan", &[])],
                vec![job("deploy", &["test", "scan"])],
            ]);
            assert!(validate_dependencies(&spec).is_empty());
        }

        #[test]
        fn reports_unresolved_dependency() {
            let spec = spec(vec![vec![job("deploy", &["build"])]]);
            let issues = validate_dependencies(&spec);
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].kind, IssueKind::UnresolvedDependency);
            assert_eq!(issues[0].job, "deploy");
        }

        #[test]
        fn reports_forward_reference() {
            let spec = spec(vec![vec![job("test", &["deploy"])], vec![job("deploy", &[])]]);
            let issues = validate_dependencies(&spec);
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].kind, IssueKind::ForwardReference);
        }

        #[test]
        fn reports_each_cycle_once() {
            let spec = spec(vec![vec![job("a", &["b"]), job("b", &["a"]), job("c", &["c"])]]);
            let cycles: Vec<_> = validate_dependencies(&spec)
                .into_iter()
                .filter(|i| i.kind == IssueKind::DependencyCycle)
                .collect();
            assert_eq!(cycles.len(), 2);
            assert_eq!(cycles[0].detail, "Dependency cycle: a -> b -> a");
            assert_eq!(cycles[1].detail, "Dependency cycle: c -> c");
        }

        #[test]
        fn reports_duplicate_jobs() {
            let spec = spec(vec![vec![job("test", &[])], vec![job("test", &[])]]);
            let issues = validate_dependencies(&spec);
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].kind, IssueKind::DuplicateJob);
        }
    }
}
