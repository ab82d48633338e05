//! Filename search: walk the tree from `root`, emit files whose basename
//! matches `pattern`, pruning the well-known vendor/build directories at
//! directory entry.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

use crate::cancel::Cancellation;
use crate::config::SearchConfig;

/// A filename match, ordered best-first by fuzzy score.
#[derive(Debug, Clone)]
pub struct FileMatch {
    pub path: PathBuf,
    pub score: u32,
}

/// Walk `root`, matching each file's basename against `pattern`.
///
/// `root` is assumed to have already been authorized by the sandbox layer;
/// per-file paths encountered during the walk are descendants of `root` and
/// are not re-validated. The walk checks `cancel` between directory entries
/// and returns whatever it has collected so far if cancelled.
pub fn search_filenames(
    root: &Path,
    pattern: &str,
    config: &SearchConfig,
    cancel: &Cancellation,
) -> Vec<FileMatch> {
    let mut matcher = Matcher::new(Config::DEFAULT);
    let needle = Pattern::new(
        pattern,
        CaseMatching::Smart,
        Normalization::Smart,
        AtomKind::Fuzzy,
    );

    let mut results = Vec::new();

    let walker = WalkBuilder::new(root)
        .hidden(!config.include_hidden)
        .follow_links(config.follow_symlinks)
        .git_ignore(config.respect_gitignore)
        .git_global(config.respect_gitignore)
        .git_exclude(config.respect_gitignore)
        .filter_entry({
            let skip_dirs = config.skip_dirs.clone();
            move |entry| {
                if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                    let name = entry.file_name().to_string_lossy();
                    return !skip_dirs.iter().any(|d| d == name.as_ref());
                }
                true
            }
        })
        .build();

    for entry in walker {
        if cancel.is_cancelled() {
            break;
        }
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let Some(basename) = entry.file_name().to_str() else {
            continue;
        };

        let mut buf = Vec::new();
        let haystack = Utf32Str::new(basename, &mut buf);
        if let Some(score) = needle.score(haystack, &mut matcher) {
            results.push(FileMatch {
                path: entry.path().to_path_buf(),
                score,
            });
            if results.len() >= config.max_results {
                break;
            }
        }
    }

    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_matching_basename() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("main.rs"), "fn main() {}").unwrap();
        fs::write(tmp.path().join("lib.rs"), "pub fn x() {}").unwrap();
        fs::create_dir_all(tmp.path().join("node_modules")).unwrap();
        fs::write(tmp.path().join("node_modules").join("main.rs"), "junk").unwrap();

        let config = SearchConfig::default();
        let results = search_filenames(tmp.path(), "main", &config, &Cancellation::new());

        assert_eq!(results.len(), 1);
        assert!(results[0].path.ends_with("main.rs"));
    }

    #[test]
    fn respects_cancellation() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..50 {
            fs::write(tmp.path().join(format!("file{i}.txt")), "x").unwrap();
        }
        let config = SearchConfig::default();
        let cancel = Cancellation::new();
        cancel.cancel();
        let results = search_filenames(tmp.path(), "file", &config, &cancel);
        assert!(results.is_empty());
    }
}
