//! Feature file discovery.
//!
//! A configured path names a directory or a single file and may end in one
//! or more `:line` selectors. Directories contribute their direct `.feature`
//! children in lexical order. Results are absolute, with any selectors
//! re-attached for the engine.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const FEATURE_EXTENSION: &str = "feature";

/// Split trailing `:line` selectors off `spec`.
///
/// # Examples
///
/// ```
/// use stepbridge::discovery::split_line_selectors;
///
/// assert_eq!(split_line_selectors("a.feature:7"), ("a.feature", ":7"));
/// assert_eq!(split_line_selectors("a.feature:3:9"), ("a.feature", ":3:9"));
/// assert_eq!(split_line_selectors("features/"), ("features/", ""));
/// ```
#[must_use]
pub fn split_line_selectors(spec: &str) -> (&str, &str) {
    let mut path = spec;
    while let Some((head, tail)) = path.rsplit_once(':') {
        if head.is_empty() || tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
            break;
        }
        path = head;
    }
    spec.split_at(path.len())
}

/// Resolve one configured path into absolute feature paths.
///
/// Line selectors on a directory are ignored.
///
/// # Errors
///
/// Returns [`ConfigError::FeaturePath`] when the path cannot be read.
pub fn find_features(base_directory: &Path, spec: &str) -> Result<Vec<String>, ConfigError> {
    let (path, selectors) = split_line_selectors(spec);
    let missing = || ConfigError::FeaturePath(PathBuf::from(spec));
    let absolute = base_directory.join(path);
    let metadata = fs::metadata(&absolute).map_err(|_| missing())?;

    if metadata.is_dir() {
        if !selectors.is_empty() {
            tracing::warn!(path = spec, "line selectors are ignored for directories");
        }
        let mut files: Vec<PathBuf> = fs::read_dir(&absolute)
            .map_err(|_| missing())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|candidate| {
                candidate.is_file()
                    && candidate.extension().is_some_and(|ext| ext == FEATURE_EXTENSION)
            })
            .collect();
        files.sort();
        Ok(files
            .into_iter()
            .map(|file| file.to_string_lossy().into_owned())
            .collect())
    } else {
        Ok(vec![format!("{}{selectors}", absolute.to_string_lossy())])
    }
}
