//! Edit Safety Validator (C7): confirms `old_text` is actually present in
//! the current file content before the pipeline commits to replacing it,
//! trying successively more tolerant matching rules.

use serde::Serialize;

use crate::lineending::{detect, to_lf, LineEnding};

/// Which tolerance rule a successful match was found under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchTier {
    /// Byte-exact after only CRLF -> LF normalization on both sides.
    Exact,
    /// Matched after additionally trimming trailing whitespace per line.
    WhitespaceTolerant,
}

/// Diagnostics surfaced whether or not validation succeeds, so a failure
/// message can point at a likely root cause instead of a bare "not found".
#[derive(Debug, Clone, Serialize)]
pub struct ValidationDiagnostics {
    pub old_text_line_count: usize,
    pub exact_matches: usize,
    pub normalized_matches: usize,
    pub file_line_ending_kind: LineEnding,
    pub error_detail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub can_proceed: bool,
    pub tier: Option<MatchTier>,
    pub diagnostics: ValidationDiagnostics,
}

/// Trim trailing spaces/tabs from every line, preserving the line breaks
/// themselves.
fn trim_trailing_whitespace(content: &str) -> String {
    content
        .split('\n')
        .map(|line| line.trim_end_matches([' ', '\t']))
        .collect::<Vec<_>>()
        .join("\n")
}

fn likely_causes(content: &str, old_text: &str) -> String {
    let mut causes = Vec::new();
    if content.starts_with('\u{feff}') {
        causes.push("file begins with a byte-order mark (BOM)");
    }
    if old_text.contains('\u{00a0}') || content.contains('\u{00a0}') {
        causes.push("non-breaking space (U+00A0) present where a regular space is expected");
    }
    if old_text.chars().any(|c| !c.is_ascii()) || content.chars().any(|c| !c.is_ascii()) {
        causes.push("non-ASCII text may differ under Unicode normalization (NFC vs NFD)");
    }
    if causes.is_empty() {
        "old_text does not appear in the current file content under any tolerated normalization"
            .to_string()
    } else {
        causes.join("; ")
    }
}

/// Validate that `old_text` can be located in `content`, trying (1) a
/// byte-exact match after CRLF normalization, then (2) a trailing-
/// whitespace-tolerant match. Returns diagnostics either way.
pub fn validate(content: &str, old_text: &str) -> ValidationOutcome {
    let file_line_ending_kind = detect(content);
    let old_text_line_count = old_text.lines().count().max(1);

    let normalized_content = to_lf(content);
    let normalized_old = to_lf(old_text);
    let exact_matches = count_occurrences(&normalized_content, &normalized_old);

    if exact_matches > 0 {
        return ValidationOutcome {
            can_proceed: true,
            tier: Some(MatchTier::Exact),
            diagnostics: ValidationDiagnostics {
                old_text_line_count,
                exact_matches,
                normalized_matches: exact_matches,
                file_line_ending_kind,
                error_detail: None,
            },
        };
    }

    let trimmed_content = trim_trailing_whitespace(&normalized_content);
    let trimmed_old = trim_trailing_whitespace(&normalized_old);
    let normalized_matches = count_occurrences(&trimmed_content, &trimmed_old);

    if normalized_matches > 0 {
        return ValidationOutcome {
            can_proceed: true,
            tier: Some(MatchTier::WhitespaceTolerant),
            diagnostics: ValidationDiagnostics {
                old_text_line_count,
                exact_matches: 0,
                normalized_matches,
                file_line_ending_kind,
                error_detail: None,
            },
        };
    }

    ValidationOutcome {
        can_proceed: false,
        tier: None,
        diagnostics: ValidationDiagnostics {
            old_text_line_count,
            exact_matches: 0,
            normalized_matches: 0,
            file_line_ending_kind,
            error_detail: Some(likely_causes(content, old_text)),
        },
    }
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_in_plain_content() {
        let outcome = validate("fn main() {}\n", "fn main()");
        assert!(outcome.can_proceed);
        assert_eq!(outcome.tier, Some(MatchTier::Exact));
    }

    #[test]
    fn crlf_file_matches_lf_old_text() {
        let content = "line one\r\nline two\r\n";
        let outcome = validate(content, "line one\nline two");
        assert!(outcome.can_proceed);
        assert_eq!(outcome.tier, Some(MatchTier::Exact));
        assert_eq!(outcome.diagnostics.file_line_ending_kind, LineEnding::Crlf);
    }

    #[test]
    fn trailing_whitespace_tolerant_match() {
        let content = "def f():   \n    return 1\n";
        let outcome = validate(content, "def f():\n    return 1");
        assert!(outcome.can_proceed);
        assert_eq!(outcome.tier, Some(MatchTier::WhitespaceTolerant));
    }

    #[test]
    fn reports_diagnostics_on_total_miss() {
        let outcome = validate("hello world\n", "goodbye");
        assert!(!outcome.can_proceed);
        assert!(outcome.diagnostics.error_detail.is_some());
    }

    #[test]
    fn bom_is_flagged_as_a_likely_cause() {
        let content = "\u{feff}hello\n";
        let outcome = validate(content, "absent");
        assert!(outcome.diagnostics.error_detail.unwrap().contains("BOM"));
    }
}
