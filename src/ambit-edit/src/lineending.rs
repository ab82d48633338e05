//! Line-ending detection and preservation.
//!
//! An edit that spans a mixed-line-ending region preserves the file's
//! *dominant* convention rather than normalizing the whole file (spec.md
//! §9 Open Questions, resolved in DESIGN.md as a majority vote; a file
//! with no newlines at all defaults to `\n`).

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum LineEnding {
    Lf,
    Crlf,
    /// Both conventions appear in the file.
    Mixed,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
            LineEnding::Mixed => "\n",
        }
    }
}

/// Classify every line ending in `content`.
pub fn detect(content: &str) -> LineEnding {
    let crlf = content.matches("\r\n").count();
    let bare_lf = content.matches('\n').count() - crlf;
    match (crlf > 0, bare_lf > 0) {
        (true, true) => LineEnding::Mixed,
        (true, false) => LineEnding::Crlf,
        _ => LineEnding::Lf,
    }
}

/// The line ending used by a strict majority of line breaks, for reapplying
/// after a CRLF/LF-normalized replacement. Ties default to LF.
pub fn dominant(content: &str) -> LineEnding {
    let crlf = content.matches("\r\n").count();
    let bare_lf = content.matches('\n').count() - crlf;
    if crlf > bare_lf {
        LineEnding::Crlf
    } else {
        LineEnding::Lf
    }
}

/// Normalize all line endings in `content` to bare `\n`.
pub fn to_lf(content: &str) -> String {
    content.replace("\r\n", "\n")
}

/// Re-apply `ending` to LF-normalized `content`.
pub fn apply(content: &str, ending: LineEnding) -> String {
    match ending {
        LineEnding::Lf | LineEnding::Mixed => content.to_string(),
        LineEnding::Crlf => content.replace('\n', "\r\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_pure_lf() {
        assert_eq!(detect("a\nb\nc\n"), LineEnding::Lf);
    }

    #[test]
    fn detects_pure_crlf() {
        assert_eq!(detect("a\r\nb\r\nc\r\n"), LineEnding::Crlf);
    }

    #[test]
    fn detects_mixed() {
        assert_eq!(detect("a\r\nb\nc\r\n"), LineEnding::Mixed);
    }

    #[test]
    fn dominant_picks_majority_and_defaults_to_lf_on_tie() {
        assert_eq!(dominant("a\r\nb\nc\r\n"), LineEnding::Crlf);
        assert_eq!(dominant("a\r\nb\n"), LineEnding::Lf);
        assert_eq!(dominant("no newlines here"), LineEnding::Lf);
    }

    #[test]
    fn round_trips_through_lf_normalization() {
        let original = "one\r\ntwo\r\nthree\r\n";
        let normalized = to_lf(original);
        assert_eq!(normalized, "one\ntwo\nthree\n");
        assert_eq!(apply(&normalized, LineEnding::Crlf), original);
    }
}
