use serde_yaml::Value;

/// A pipeline document as received, plus the outcome of parsing it.
///
/// Exactly one of `parsed` and `parse_error` is set. Any YAML root (mapping,
/// sequence or scalar) is accepted as a successful parse.
#[derive(Debug, Clone)]
pub struct PipelineDocument {
    pub raw_text: String,
    pub parsed: Option<Value>,
    pub parse_error: Option<String>,
}

impl PipelineDocument {
    /// Parses `raw_text` without ever failing; syntax errors are captured in
    /// `parse_error`.
    pub fn parse(raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        match serde_yaml::from_str::<Value>(&raw_text) {
            Ok(parsed) => Self {
                raw_text,
                parsed: Some(parsed),
                parse_error: None,
            },
            Err(e) => {
                log::debug!("Pipeline document failed to parse: {e}");
                Self {
                    raw_text,
                    parsed: None,
                    parse_error: Some(e.to_string()),
                }
            }
        }
    }

    #[cfg(test)]
    pub fn is_parsed(&self) -> bool {
        self.parse_error.is_none()
    }

    /// Root mapping, if the document parsed into one.
    pub fn root_mapping(&self) -> Option<&serde_yaml::Mapping> {
        self.parsed.as_ref().and_then(Value::as_mapping)
    }
}

/// Reads a scalar as text; sequences are joined with `", "`.
/// Job keys may be numbers or booleans in YAML; they are named by their text.
pub(crate) fn job_name(key: &Value) -> String {
    value_to_text(key).unwrap_or_default()
}

pub(crate) fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Sequence(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_to_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Tagged(tagged) => value_to_text(&tagged.value),
        Value::Null | Value::Mapping(_) => None,
    }
}

/// Job names referenced by a `needs`/`dependencies` value.
///
/// Accepts a bare string, a list of strings, or GitLab's `- job: name` form.
pub(crate) fn referenced_names(value: Option<&Value>) -> Vec<String> {
    let Some(value) = value else {
        return vec![];
    };

    match value {
        Value::String(name) => vec![name.clone()],
        Value::Sequence(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(name.clone()),
                Value::Mapping(map) => map.get("job").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect(),
        _ => vec![],
    }
}

/// Whether a mapping key equals `name` when read as a string.
pub(crate) fn key_is(key: &Value, name: &str) -> bool {
    key.as_str() == Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flow_style_mapping() {
        let doc = PipelineDocument::parse(r#"{"jobs": {"build": {}}, "on": "push"}"#);
        assert!(doc.is_parsed());
        assert!(doc.root_mapping().unwrap().contains_key("jobs"));
    }

    #[test]
    fn captures_syntax_errors_instead_of_failing() {
        let doc = PipelineDocument::parse("jobs:\n  build: [unclosed\n");
        assert!(!doc.is_parsed());
        assert!(doc.parsed.is_none());
        assert!(doc.parse_error.is_some());
    }

    #[test]
    fn accepts_non_mapping_roots() {
        let seq = PipelineDocument::parse("- a\n- b\n");
        assert!(seq.is_parsed());
        assert!(seq.root_mapping().is_none());

        let scalar = PipelineDocument::parse("just text");
        assert!(scalar.is_parsed());
        assert!(scalar.root_mapping().is_none());
    }

    #[test]
    fn referenced_names_accepts_all_shapes() {
        let single: Value = serde_yaml::from_str("build").unwrap();
        assert_eq!(referenced_names(Some(&single)), vec!["build"]);

        let list: Value = serde_yaml::from_str("[lint, test]").unwrap();
        assert_eq!(referenced_names(Some(&list)), vec!["lint", "test"]);

        let gitlab: Value = serde_yaml::from_str("- job: compile\n  artifacts: true\n").unwrap();
        assert_eq!(referenced_names(Some(&gitlab)), vec!["compile"]);

        assert!(referenced_names(None).is_empty());
    }

    #[test]
    fn value_to_text_joins_runner_labels() {
        let labels: Value = serde_yaml::from_str("[self-hosted, linux]").unwrap();
        assert_eq!(value_to_text(&labels).as_deref(), Some("self-hosted, linux"));
        assert_eq!(value_to_text(&Value::Null), None);
    }
}
