use std::path::Path;

use walkdir::WalkDir;

use crate::error::Result;

/// Directories reported as a single `name/` entry instead of being walked.
const OPAQUE_DIRS: [&str; 5] = ["node_modules", "target", "vendor", "dist", "build"];
const SKIPPED_DIRS: [&str; 1] = [".git"];
const MAX_DEPTH: usize = 12;

fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Lists the files under `root` as `/`-separated relative paths, sorted.
///
/// Dependency and build output directories are listed as `name/` without
/// descending into them, so their presence still counts as a signal.
///
/// # Errors
///
/// Returns an error if `root` or one of its entries cannot be read.
pub fn collect_paths(root: &Path) -> Result<Vec<String>> {
    let mut paths = Vec::new();

    let mut walker = WalkDir::new(root)
        .max_depth(MAX_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !(entry.file_type().is_dir()
                    && SKIPPED_DIRS.contains(&&*entry.file_name().to_string_lossy()))
        });

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.depth() == 0 {
            continue;
        }

        let rel = relative(entry.path(), root);
        if !entry.file_type().is_dir() {
            paths.push(rel);
        } else if OPAQUE_DIRS.contains(&&*entry.file_name().to_string_lossy()) {
            paths.push(format!("{rel}/"));
            walker.skip_current_dir();
        }
    }

    log::debug!("Collected {} paths under {}", paths.len(), root.display());
    Ok(paths)
}
