//! Renders a [`PipelineSpecification`] into platform documents.
//!
//! Steps are emitted as echo placeholders: the output describes the pipeline
//! shape, it does not implement the steps.

use indexmap::IndexMap;

use super::spec::PipelineSpecification;
use crate::insights::PipelineType;

pub const GITHUB_ACTIONS: &str = "github-actions";
pub const GITLAB_CI: &str = "gitlab-ci";
pub const GENERIC: &str = "generic";

/// Renders every applicable platform document, keyed by platform name.
///
/// The GitHub Actions workflow is only produced for GitHub Actions
/// specifications; GitLab CI and the generic outline are always produced.
pub fn render(spec: &PipelineSpecification) -> IndexMap<String, String> {
    let mut documents = IndexMap::new();
    if spec.pipeline_type == PipelineType::GithubActions {
        documents.insert(GITHUB_ACTIONS.to_string(), render_github_actions(spec));
    }
    documents.insert(GITLAB_CI.to_string(), render_gitlab_ci(spec));
    documents.insert(GENERIC.to_string(), render_generic(spec));
    documents
}

/// Job names are quoted so names from AI replies or hand-written specs
/// (`deploy: prod`, `*nightly`) stay plain mapping keys.
fn job_key(name: &str) -> String {
    quoted(&name.replace('-', "_"))
}

fn stage_key(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn echo(step: &str) -> String {
    quoted(&format!("echo 'Executing: {}'", step.replace('\'', "")))
}

pub fn render_github_actions(spec: &PipelineSpecification) -> String {
    let mut out = format!(
        "name: {}\n\n\
         on:\n  push:\n    branches: [main, develop]\n  pull_request:\n    branches: [main]\n\n\
         env:\n  NODE_VERSION: '18'\n  PYTHON_VERSION: '3.9'\n\n\
         jobs:\n",
        quoted(spec.name.as_deref().unwrap_or("CI/CD Pipeline"))
    );

    for job in spec.jobs() {
        out.push_str(&format!("  {}:\n    runs-on: ubuntu-latest\n", job_key(&job.name)));
        if !job.dependencies.is_empty() {
            let needs: Vec<String> = job.dependencies.iter().map(|d| job_key(d)).collect();
            out.push_str(&format!("    needs: [{}]\n", needs.join(", ")));
        }
        out.push_str("    steps:\n");
        for step in &job.steps {
            out.push_str(&format!(
                "      - name: {}\n        run: {}\n",
                quoted(step),
                echo(step)
            ));
        }
    }

    out
}

pub fn render_gitlab_ci(spec: &PipelineSpecification) -> String {
    let mut out = String::from("# GitLab CI Pipeline\nstages:\n");
    for stage in &spec.stages {
        out.push_str(&format!("  - {}\n", quoted(&stage_key(&stage.name))));
    }
    out.push_str("\nvariables:\n  NODE_VERSION: \"18\"\n  PYTHON_VERSION: \"3.9\"\n");

    for stage in &spec.stages {
        for job in &stage.jobs {
            out.push_str(&format!(
                "\n{}:\n  stage: {}\n",
                job_key(&job.name),
                quoted(&stage_key(&stage.name))
            ));
            if !job.dependencies.is_empty() {
                let needs: Vec<String> = job.dependencies.iter().map(|d| job_key(d)).collect();
                out.push_str(&format!("  needs: [{}]\n", needs.join(", ")));
            }
            out.push_str("  script:\n");
            for step in &job.steps {
                out.push_str(&format!("    - {}\n", echo(step)));
            }
        }
    }

    out
}

pub fn render_generic(spec: &PipelineSpecification) -> String {
    let mut out = format!(
        "# Generic CI/CD Pipeline Specification\n\
         # This can be adapted to any CI/CD platform\n\n\
         Pipeline: {}\n\
         Estimated Time: {}\n\n\
         Stages:\n",
        spec.name.as_deref().unwrap_or("Custom Pipeline"),
        spec.estimated_metrics
            .total_pipeline_time
            .as_deref()
            .unwrap_or("Unknown"),
    );

    for (number, stage) in spec.stages.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}:\n   Description: {}\n   Jobs:\n",
            number + 1,
            stage.name,
            stage.description
        ));
        for job in &stage.jobs {
            out.push_str(&format!(
                "     - {}: {}\n       Steps: {}\n       Estimated Time: {}\n",
                job.name,
                job.description,
                job.steps.join(", "),
                job.estimated_time.as_deref().unwrap_or("Unknown")
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::fallback::fallback_specification;
    use crate::generation::spec::Job;
    use crate::insights::TechStackProfile;
    use crate::pipeline::{analyze_structure, PipelineDocument};

    fn fallback() -> PipelineSpecification {
        fallback_specification(&TechStackProfile::default(), "aws")
    }

    #[test]
    fn generic_outline_names_every_stage_and_job() {
        let spec = fallback();
        let outline = render_generic(&spec);
        for stage in &spec.stages {
            assert!(outline.contains(&stage.name), "missing stage {}", stage.name);
            for job in &stage.jobs {
                assert!(outline.contains(&job.name), "missing job {}", job.name);
            }
        }
        assert!(outline.contains("Pipeline: Custom Pipeline"));
        assert!(outline.contains("Estimated Time: 12-20 minutes"));
        assert!(outline.contains("1. Build & Test:"));
        assert!(outline.contains("3. Deploy:"));
    }

    #[test]
    fn github_workflow_is_only_rendered_for_github_specs() {
        let mut spec = fallback();
        let documents = render(&spec);
        assert_eq!(
            documents.keys().collect::<Vec<_>>(),
            [GITHUB_ACTIONS, GITLAB_CI, GENERIC]
        );

        spec.pipeline_type = PipelineType::GitlabCi;
        let documents = render(&spec);
        assert!(!documents.contains_key(GITHUB_ACTIONS));
        assert!(documents.contains_key(GENERIC));
    }

    #[test]
    fn github_workflow_is_valid_and_reclassifies() {
        let workflow = render_github_actions(&fallback());
        assert!(workflow.contains("  \"security_scan\":\n"));
        assert!(workflow.contains("needs: [\"test\", \"security_scan\"]"));

        let document = PipelineDocument::parse(workflow);
        assert!(document.is_parsed(), "{:?}", document.parse_error);
        let structure = analyze_structure(&document);
        assert_eq!(structure.pipeline_type, PipelineType::GithubActions);
        assert_eq!(structure.job_count, 3);
        assert_eq!(structure.dependency_edges.len(), 2);
    }

    #[test]
    fn gitlab_document_is_valid_and_reclassifies() {
        let pipeline = render_gitlab_ci(&fallback());
        assert!(pipeline.contains("  - \"build-&-test\"\n"));
        assert!(pipeline.contains("  stage: \"security-&-quality\"\n"));

        let document = PipelineDocument::parse(pipeline);
        let structure = analyze_structure(&document);
        assert_eq!(structure.pipeline_type, PipelineType::GitlabCi);
        assert_eq!(structure.job_count, 3);
    }

    #[test]
    fn quotes_in_steps_stay_valid_yaml() {
        let mut spec = fallback();
        spec.stages[0].jobs[0].steps = vec!["Run \"make test\" it's fine".to_string()];
        let document = PipelineDocument::parse(render_github_actions(&spec));
        assert!(document.is_parsed(), "{:?}", document.parse_error);
    }

    fn awkward_spec() -> PipelineSpecification {
        let mut spec = fallback();
        let names = ["deploy: prod", "lint # fast", "*nightly", "&anchor"];
        spec.stages.truncate(1);
        spec.stages[0].jobs = names
            .iter()
            .map(|name| Job {
                name: (*name).to_string(),
                steps: vec!["run".to_string()],
                ..Job::default()
            })
            .collect();
        spec.stages[0].jobs[3].dependencies = vec!["deploy: prod".to_string()];
        spec
    }

    #[test]
    fn awkward_job_names_stay_valid_github_yaml() {
        let document = PipelineDocument::parse(render_github_actions(&awkward_spec()));
        assert!(document.is_parsed(), "{:?}", document.parse_error);

        let structure = analyze_structure(&document);
        assert_eq!(structure.job_count, 4);
        assert_eq!(structure.dependency_edges.len(), 1);
        assert_eq!(structure.dependency_edges[0].from, "deploy: prod");
        assert_eq!(structure.dependency_edges[0].to, "&anchor");
    }

    #[test]
    fn awkward_job_names_stay_valid_gitlab_yaml() {
        let document = PipelineDocument::parse(render_gitlab_ci(&awkward_spec()));
        assert!(document.is_parsed(), "{:?}", document.parse_error);

        let root = document.root_mapping().unwrap();
        for name in ["deploy: prod", "lint # fast", "*nightly", "&anchor"] {
            assert!(root.contains_key(name), "missing job {name}");
        }
        assert_eq!(root["&anchor"]["needs"][0].as_str(), Some("deploy: prod"));
    }
}
