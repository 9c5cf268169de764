//! `.aifm` file discovery
//!
//! Resolves a mixed list of files and folders into a sorted, deduplicated
//! list of bundle paths. Folders are walked recursively.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

/// Whether a path carries the `.aifm` extension (case-insensitive)
pub fn is_aifm(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("aifm"))
        .unwrap_or(false)
}

/// Collect `.aifm` files from files and directories.
///
/// Non-matching inputs are skipped with a warning rather than failing the
/// whole load. Output is sorted and deduplicated.
pub fn collect_aifm_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = BTreeSet::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() && is_aifm(entry.path()) {
                    found.insert(entry.path().to_path_buf());
                }
            }
        } else if input.is_file() && is_aifm(input) {
            found.insert(input.clone());
        } else {
            warn!(path = %input.display(), "Skipping input: not an .aifm file or folder");
        }
    }
    found.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_aifm(Path::new("track.aifm")));
        assert!(is_aifm(Path::new("track.AIFM")));
        assert!(!is_aifm(Path::new("track.mp3")));
        assert!(!is_aifm(Path::new("aifm")));
    }

    #[test]
    fn collects_recursively_and_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("inner");
        std::fs::create_dir(&nested).unwrap();
        let a = dir.path().join("a.aifm");
        let b = nested.join("b.aifm");
        std::fs::write(&a, b"x").unwrap();
        std::fs::write(&b, b"y").unwrap();
        std::fs::write(dir.path().join("skip.mp3"), b"z").unwrap();

        // folder scan plus an explicit duplicate of a member file
        let found = collect_aifm_files(&[dir.path().to_path_buf(), a.clone()]);
        assert_eq!(found, vec![a, b]);
    }

    #[test]
    fn missing_paths_are_skipped() {
        let found = collect_aifm_files(&[PathBuf::from("/nonexistent/x.aifm")]);
        assert!(found.is_empty());
    }
}
