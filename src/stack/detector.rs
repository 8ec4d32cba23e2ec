use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use log::debug;

use super::signatures::{
    category_of, Signature, CATEGORIES, DATABASES, DEPLOYMENT_TOOLS, FRAMEWORKS, LANGUAGES, TOOLS,
};
use crate::insights::{Detection, LanguageDetection, TechStackProfile};

/// Signatures must match more than this share of their patterns to be reported.
const MIN_SIGNATURE_CONFIDENCE: f64 = 0.3;
const DETECTIONS_FOR_FULL_CONFIDENCE: f64 = 10.0;

/// Infers languages, frameworks and tools from repository file paths.
///
/// Only paths are inspected, never file contents. The result depends on the
/// set of paths, not on their order.
pub fn detect_tech_stack<S: AsRef<str>>(paths: &[S]) -> TechStackProfile {
    let lowered: BTreeSet<String> = paths.iter().map(|p| p.as_ref().to_lowercase()).collect();

    let languages = detect_languages(paths);
    let frameworks = match_signatures(FRAMEWORKS, &lowered);

    let mut tools_by_category: IndexMap<String, Vec<Detection>> = CATEGORIES
        .iter()
        .map(|category| ((*category).to_string(), Vec::new()))
        .collect();
    for detection in match_signatures(TOOLS, &lowered) {
        tools_by_category
            .entry(category_of(&detection.name).to_string())
            .or_default()
            .push(detection);
    }

    let count_in = |category: &str| tools_by_category.get(category).map_or(0, Vec::len);
    let total_detections =
        languages.len() + frameworks.len() + count_in(DATABASES) + count_in(DEPLOYMENT_TOOLS);

    #[allow(clippy::cast_precision_loss)]
    let confidence_score = (total_detections as f64 / DETECTIONS_FOR_FULL_CONFIDENCE).min(1.0);

    debug!(
        "Detected {} languages, {} frameworks across {} paths",
        languages.len(),
        frameworks.len(),
        paths.len()
    );

    TechStackProfile {
        languages,
        frameworks,
        tools_by_category,
        confidence_score,
    }
}

fn extension(path: &str) -> Option<String> {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let (stem, ext) = file_name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_lowercase())
}

fn detect_languages<S: AsRef<str>>(paths: &[S]) -> Vec<LanguageDetection> {
    let mut histogram: BTreeMap<&'static str, usize> = BTreeMap::new();
    for ext in paths.iter().filter_map(|p| extension(p.as_ref())) {
        if let Some((_, language)) = LANGUAGES.iter().find(|(known, _)| *known == ext) {
            *histogram.entry(language).or_insert(0) += 1;
        }
    }

    let total = paths.len().max(1);
    let mut languages: Vec<LanguageDetection> = histogram
        .into_iter()
        .map(|(name, file_count)| {
            #[allow(clippy::cast_precision_loss)]
            let confidence = (file_count as f64 / total as f64).min(1.0);
            LanguageDetection {
                name: name.to_string(),
                confidence,
                file_count,
            }
        })
        .collect();

    // Most files first; BTreeMap order breaks ties by name
    languages.sort_by(|a, b| b.file_count.cmp(&a.file_count));
    languages
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_prefix('*') {
        Some(suffix) => path.ends_with(suffix),
        None => path.contains(pattern),
    }
}

fn match_signatures(signatures: &[Signature], paths: &BTreeSet<String>) -> Vec<Detection> {
    signatures
        .iter()
        .filter_map(|signature| {
            let matches = signature
                .patterns
                .iter()
                .filter(|pattern| paths.iter().any(|path| pattern_matches(pattern, path)))
                .count();

            #[allow(clippy::cast_precision_loss)]
            let confidence = (matches as f64 / signature.patterns.len().max(1) as f64).min(1.0);

            (confidence > MIN_SIGNATURE_CONFIDENCE).then(|| Detection {
                name: signature.name.to_string(),
                confidence,
                matches,
            })
        })
        .collect()
}
