//! Tiered replacement strategies for the Edit Pipeline (C8 step 7): exact
//! substring replacement first, then a CRLF/LF-normalized pass that
//! reapplies the file's dominant line ending, then a trailing-whitespace-
//! tolerant line-window match. Each tier either performs exactly
//! `occurrences` substitutions under its own matching semantics or falls
//! through to the next tier -- never a partial substitution.

use thiserror::Error;

use crate::lineending::{apply as apply_ending, dominant, to_lf};

/// Which occurrences of `old_text` a caller wants substituted.
#[derive(Debug, Clone, Copy)]
pub enum MatchMode {
    /// Replace every occurrence.
    All,
    /// Require exactly one occurrence; fail otherwise.
    Unique,
    /// `1..N` is the nth occurrence (1-indexed); `-1` is the last, `-2`
    /// the second-to-last, and so on.
    Nth(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceTier {
    /// Exact substring match against the file's bytes, unmodified.
    Raw,
    /// Matched after CRLF -> LF normalization; the file's dominant line
    /// ending is reapplied to the result.
    LineEndingNormalized,
    /// Matched only after additionally trimming trailing whitespace per
    /// line of a multi-line `old_text`.
    WhitespaceTolerant,
}

#[derive(Debug, Clone)]
pub struct ReplaceOutcome {
    pub content: String,
    pub replacement_count: usize,
    pub tier: ReplaceTier,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplaceError {
    #[error("old_text not found")]
    NotFound,
    #[error("{0} occurrences found but a unique match was required")]
    MultipleMatches(usize),
    #[error("occurrence index {requested} is out of range ({available} occurrence(s) present)")]
    NthOutOfRange { requested: i64, available: usize },
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        0
    } else {
        haystack.matches(needle).count()
    }
}

/// Resolve `mode` against an occurrence count into the 0-indexed set of
/// occurrences to actually replace.
fn select_indices(occurrences: usize, mode: MatchMode) -> Result<Vec<usize>, ReplaceError> {
    if occurrences == 0 {
        return Err(ReplaceError::NotFound);
    }
    match mode {
        MatchMode::All => Ok((0..occurrences).collect()),
        MatchMode::Unique => {
            if occurrences == 1 {
                Ok(vec![0])
            } else {
                Err(ReplaceError::MultipleMatches(occurrences))
            }
        }
        MatchMode::Nth(n) => {
            let idx = if n > 0 {
                (n as usize).checked_sub(1)
            } else if n < 0 {
                let from_end = (-n) as usize;
                (occurrences).checked_sub(from_end)
            } else {
                None
            };
            match idx {
                Some(idx) if idx < occurrences => Ok(vec![idx]),
                _ => Err(ReplaceError::NthOutOfRange {
                    requested: n,
                    available: occurrences,
                }),
            }
        }
    }
}

fn replace_substring_occurrences(
    content: &str,
    old: &str,
    new: &str,
    indices: &[usize],
) -> String {
    let mut result = String::with_capacity(content.len());
    let mut cursor = 0;
    for (i, (start, _)) in content.match_indices(old).enumerate() {
        if indices.contains(&i) {
            result.push_str(&content[cursor..start]);
            result.push_str(new);
            cursor = start + old.len();
        }
    }
    result.push_str(&content[cursor..]);
    result
}

fn trim_trailing(line: &str) -> &str {
    line.trim_end_matches([' ', '\t'])
}

/// Non-overlapping starting line-indices where every line of `old_lines`
/// matches the corresponding content line up to trailing whitespace.
fn whitespace_tolerant_positions(content_lines: &[&str], old_lines: &[&str]) -> Vec<usize> {
    let window = old_lines.len();
    if window == 0 || content_lines.len() < window {
        return Vec::new();
    }
    let mut positions = Vec::new();
    let mut i = 0;
    while i + window <= content_lines.len() {
        let is_match = (0..window).all(|k| trim_trailing(content_lines[i + k]) == trim_trailing(old_lines[k]));
        if is_match {
            positions.push(i);
            i += window;
        } else {
            i += 1;
        }
    }
    positions
}

fn replace_line_windows(
    content_lines: &[&str],
    window: usize,
    new_lines: &[&str],
    chosen: &[usize],
) -> Vec<String> {
    let mut out = Vec::with_capacity(content_lines.len());
    let mut i = 0;
    while i < content_lines.len() {
        if chosen.contains(&i) {
            out.extend(new_lines.iter().map(|l| l.to_string()));
            i += window;
        } else {
            out.push(content_lines[i].to_string());
            i += 1;
        }
    }
    out
}

/// Apply the tiered replacement strategy, stopping at the first tier that
/// locates at least one occurrence of `old`.
pub fn apply(content: &str, old: &str, new: &str, mode: MatchMode) -> Result<ReplaceOutcome, ReplaceError> {
    let raw_occurrences = count_occurrences(content, old);
    if raw_occurrences > 0 {
        let indices = select_indices(raw_occurrences, mode)?;
        let replaced = replace_substring_occurrences(content, old, new, &indices);
        return Ok(ReplaceOutcome {
            content: replaced,
            replacement_count: indices.len(),
            tier: ReplaceTier::Raw,
        });
    }

    let ending = dominant(content);
    let normalized_content = to_lf(content);
    let normalized_old = to_lf(old);
    let normalized_new = to_lf(new);
    let normalized_occurrences = count_occurrences(&normalized_content, &normalized_old);
    if normalized_occurrences > 0 {
        let indices = select_indices(normalized_occurrences, mode)?;
        let replaced = replace_substring_occurrences(&normalized_content, &normalized_old, &normalized_new, &indices);
        return Ok(ReplaceOutcome {
            content: apply_ending(&replaced, ending),
            replacement_count: indices.len(),
            tier: ReplaceTier::LineEndingNormalized,
        });
    }

    let content_lines: Vec<&str> = normalized_content.split('\n').collect();
    let old_lines: Vec<&str> = normalized_old.split('\n').collect();
    let new_lines: Vec<&str> = normalized_new.split('\n').collect();
    let positions = whitespace_tolerant_positions(&content_lines, &old_lines);
    if positions.is_empty() {
        return Err(ReplaceError::NotFound);
    }

    let chosen = select_indices(positions.len(), mode)?
        .into_iter()
        .map(|i| positions[i])
        .collect::<Vec<_>>();
    let rebuilt = replace_line_windows(&content_lines, old_lines.len(), &new_lines, &chosen);
    let joined = rebuilt.join("\n");
    Ok(ReplaceOutcome {
        content: apply_ending(&joined, ending),
        replacement_count: chosen.len(),
        tier: ReplaceTier::WhitespaceTolerant,
    })
}

/// Count non-overlapping occurrences of `old` across all three tiers, for
/// callers (e.g. `count_occurrences` tool, risk assessment) that only need
/// the count and not a replacement.
pub fn count_all_tiers(content: &str, old: &str) -> usize {
    let raw = count_occurrences(content, old);
    if raw > 0 {
        return raw;
    }
    let normalized_content = to_lf(content);
    let normalized_old = to_lf(old);
    let normalized = count_occurrences(&normalized_content, &normalized_old);
    if normalized > 0 {
        return normalized;
    }
    let content_lines: Vec<&str> = normalized_content.split('\n').collect();
    let old_lines: Vec<&str> = normalized_old.split('\n').collect();
    whitespace_tolerant_positions(&content_lines, &old_lines).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_unique_occurrence() {
        let outcome = apply("let x = 1;", "x", "y", MatchMode::Unique).unwrap();
        assert_eq!(outcome.content, "let y = 1;");
        assert_eq!(outcome.replacement_count, 1);
        assert_eq!(outcome.tier, ReplaceTier::Raw);
    }

    #[test]
    fn unique_mode_rejects_multiple_matches() {
        let err = apply("aa bb aa", "aa", "x", MatchMode::Unique).unwrap_err();
        assert_eq!(err, ReplaceError::MultipleMatches(2));
    }

    #[test]
    fn replace_all_substitutes_every_occurrence() {
        let outcome = apply("aa bb aa cc aa", "aa", "Z", MatchMode::All).unwrap();
        assert_eq!(outcome.content, "Z bb Z cc Z");
        assert_eq!(outcome.replacement_count, 3);
    }

    #[test]
    fn nth_occurrence_from_start_and_end() {
        let first = apply("a a a", "a", "X", MatchMode::Nth(1)).unwrap();
        assert_eq!(first.content, "X a a");

        let last = apply("a a a", "a", "X", MatchMode::Nth(-1)).unwrap();
        assert_eq!(last.content, "a a X");

        let penultimate = apply("a a a", "a", "X", MatchMode::Nth(-2)).unwrap();
        assert_eq!(penultimate.content, "a X a");
    }

    #[test]
    fn nth_out_of_range_is_an_error() {
        let err = apply("a a", "a", "X", MatchMode::Nth(5)).unwrap_err();
        assert!(matches!(err, ReplaceError::NthOutOfRange { .. }));
    }

    #[test]
    fn line_ending_tier_preserves_crlf_convention() {
        let content = "one\r\ntwo\r\nthree\r\n";
        // "two\nthree" only matches after CRLF -> LF normalization, so the
        // raw tier misses and this exercises the line-ending tier.
        let outcome = apply(content, "two\nthree", "TWO\nTHREE", MatchMode::Unique).unwrap();
        assert_eq!(outcome.tier, ReplaceTier::LineEndingNormalized);
        assert_eq!(outcome.content, "one\r\nTWO\r\nTHREE\r\n");
    }

    #[test]
    fn whitespace_tolerant_tier_matches_trailing_spaces() {
        let content = "def f():   \n    return 1\n";
        let old = "def f():\n    return 1";
        let new = "def g():\n    return 2";
        let outcome = apply(content, old, new, MatchMode::Unique).unwrap();
        assert_eq!(outcome.tier, ReplaceTier::WhitespaceTolerant);
        assert_eq!(outcome.content, "def g():\n    return 2\n");
        assert_eq!(outcome.replacement_count, 1);
    }

    #[test]
    fn not_found_propagates() {
        let err = apply("hello", "absent", "x", MatchMode::Unique).unwrap_err();
        assert_eq!(err, ReplaceError::NotFound);
    }

    #[test]
    fn count_all_tiers_matches_replace_all_count() {
        assert_eq!(count_all_tiers("aa bb aa", "aa"), 2);
        assert_eq!(count_all_tiers("a\r\nb", "a\nb"), 1);
    }
}
