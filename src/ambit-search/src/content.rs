//! Content search: regex matches with `(line, char_start, char_end)`
//! coordinates, computed from the regex engine's own match indices so
//! multiple occurrences on one line are each reported correctly.

use std::path::{Path, PathBuf};

use ambit_cache::RegexCache;
use ignore::WalkBuilder;
use thiserror::Error;

use crate::cancel::Cancellation;
use crate::config::SearchConfig;

#[derive(Debug, Clone)]
pub struct SearchMatch {
    pub file: PathBuf,
    pub line_number: usize,
    pub line_text: String,
    pub match_start: usize,
    pub match_end: usize,
    pub context_before: Vec<String>,
    pub context_after: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ContentSearchError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] ambit_cache::RegexCacheError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContentSearchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub context_lines: usize,
}

fn build_pattern(pattern: &str, options: &ContentSearchOptions) -> String {
    let core = if options.whole_word {
        format!(r"\b(?:{pattern})\b")
    } else {
        pattern.to_string()
    };
    if options.case_sensitive {
        core
    } else {
        format!("(?i){core}")
    }
}

/// Convert a byte offset into `line` to a char offset, so `match_start`/
/// `match_end` are usable as Unicode-aware string indices.
fn byte_to_char_offset(line: &str, byte_offset: usize) -> usize {
    line[..byte_offset].chars().count()
}

/// Search file contents under `root` for `pattern`, honoring the skip-dir
/// set and text-extension heuristic, producing one [`SearchMatch`] per
/// occurrence (not per line).
pub fn search_content(
    root: &Path,
    pattern: &str,
    config: &SearchConfig,
    options: &ContentSearchOptions,
    regex_cache: &RegexCache,
    cancel: &Cancellation,
) -> Result<Vec<SearchMatch>, ContentSearchError> {
    let compiled_pattern = build_pattern(pattern, options);
    let regex = regex_cache.get_or_compile(&compiled_pattern)?;

    let mut results = Vec::new();

    let walker = WalkBuilder::new(root)
        .hidden(!config.include_hidden)
        .follow_links(config.follow_symlinks)
        .git_ignore(config.respect_gitignore)
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

    'files: for entry in walker {
        if cancel.is_cancelled() {
            break;
        }
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        if !config.looks_like_text(path) {
            continue;
        }

        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };
        let lines: Vec<&str> = content.lines().collect();

        for (idx, line) in lines.iter().enumerate() {
            if cancel.is_cancelled() {
                break 'files;
            }
            for m in regex.find_iter(line) {
                let context_before = context_window(&lines, idx, options.context_lines, true);
                let context_after = context_window(&lines, idx, options.context_lines, false);

                results.push(SearchMatch {
                    file: path.to_path_buf(),
                    line_number: idx + 1,
                    line_text: line.to_string(),
                    match_start: byte_to_char_offset(line, m.start()),
                    match_end: byte_to_char_offset(line, m.end()),
                    context_before,
                    context_after,
                });

                if results.len() >= config.max_results {
                    break 'files;
                }
            }
        }
    }

    Ok(results)
}

fn context_window(lines: &[&str], idx: usize, n: usize, before: bool) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }
    if before {
        let start = idx.saturating_sub(n);
        lines[start..idx].iter().map(|l| l.to_string()).collect()
    } else {
        let end = (idx + 1 + n).min(lines.len());
        lines[(idx + 1)..end].iter().map(|l| l.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_multiple_occurrences_on_one_line() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.rs"), "let x = foo + foo;\n").unwrap();

        let cache = RegexCache::default();
        let results = search_content(
            tmp.path(),
            "foo",
            &SearchConfig::default(),
            &ContentSearchOptions::default(),
            &cache,
            &Cancellation::new(),
        )
        .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].match_start, 8);
        assert_eq!(results[0].match_end, 11);
        assert_eq!(results[1].match_start, 14);
        assert_eq!(results[1].match_end, 17);
    }

    #[test]
    fn whole_word_excludes_partial_matches() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.rs"), "foobar foo\n").unwrap();

        let cache = RegexCache::default();
        let options = ContentSearchOptions {
            whole_word: true,
            ..Default::default()
        };
        let results = search_content(
            tmp.path(),
            "foo",
            &SearchConfig::default(),
            &options,
            &cache,
            &Cancellation::new(),
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_start, 7);
    }

    #[test]
    fn skips_binary_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("data.bin"), [0u8, 1, 2, b'f', b'o', b'o']).unwrap();

        let cache = RegexCache::default();
        let results = search_content(
            tmp.path(),
            "foo",
            &SearchConfig::default(),
            &ContentSearchOptions::default(),
            &cache,
            &Cancellation::new(),
        )
        .unwrap();

        assert!(results.is_empty());
    }

    #[test]
    fn captures_context_lines() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.rs"), "one\ntwo\nthree\nfour\nfive\n").unwrap();

        let cache = RegexCache::default();
        let options = ContentSearchOptions {
            context_lines: 1,
            ..Default::default()
        };
        let results = search_content(
            tmp.path(),
            "three",
            &SearchConfig::default(),
            &options,
            &cache,
            &Cancellation::new(),
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].context_before, vec!["two".to_string()]);
        assert_eq!(results[0].context_after, vec!["four".to_string()]);
    }
}
