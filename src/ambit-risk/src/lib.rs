//! Change-impact classification for a proposed `(old, new)` replacement.
//!
//! Given the current file content and a replacement pair, [`assess`]
//! computes how many non-overlapping occurrences of `old` exist, how much
//! of the file that substitution would touch, and a LOW/MEDIUM/HIGH/CRITICAL
//! classification that the edit pipeline uses to decide whether to block
//! the edit absent an explicit `force`.

use serde::Serialize;

/// Risk classification of a proposed edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Percent thresholds and occurrence-count thresholds used to classify risk.
#[derive(Debug, Clone, Copy)]
pub struct RiskThresholds {
    pub medium_change_percent: f64,
    pub high_change_percent: f64,
    pub critical_change_percent: f64,
    pub medium_occurrences: usize,
    pub high_occurrences: usize,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium_change_percent: 30.0,
            high_change_percent: 50.0,
            critical_change_percent: 90.0,
            medium_occurrences: 50,
            high_occurrences: 100,
        }
    }
}

/// Structured impact of a proposed replacement.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeImpact {
    pub total_lines: usize,
    pub occurrences: usize,
    /// May exceed 100% when `new` is longer than `old` and occurrences are many.
    pub change_percentage: f64,
    pub chars_changed: u64,
    pub risk_level: RiskLevel,
    pub is_risky: bool,
    pub factors: Vec<String>,
}

impl ChangeImpact {
    /// A human-readable warning summarizing why the edit was classified
    /// the way it was, for surfacing in a blocked-edit error message.
    pub fn warning(&self) -> String {
        if self.factors.is_empty() {
            format!(
                "{:?} risk: {} occurrence(s), {:.1}% of file changed",
                self.risk_level, self.occurrences, self.change_percentage
            )
        } else {
            format!(
                "{:?} risk: {}",
                self.risk_level,
                self.factors.join("; ")
            )
        }
    }
}

/// Count non-overlapping occurrences of `needle` in `haystack`.
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// Classify the impact of replacing every occurrence of `old` with `new`
/// inside `content`.
pub fn assess(content: &str, old: &str, new: &str, thresholds: &RiskThresholds) -> ChangeImpact {
    let occurrences = count_occurrences(content, old);
    let per_occurrence_delta = (new.len() as i64 - old.len() as i64).unsigned_abs();
    let chars_changed = per_occurrence_delta * occurrences as u64;

    let file_len = content.len().max(1) as f64;
    let change_percentage = (chars_changed as f64 / file_len) * 100.0;

    let mut factors = Vec::new();
    let mut level = RiskLevel::Low;

    if change_percentage >= thresholds.critical_change_percent {
        level = RiskLevel::Critical;
        factors.push(format!(
            "change affects {change_percentage:.1}% of the file (critical threshold {:.0}%)",
            thresholds.critical_change_percent
        ));
    }
    if change_percentage >= thresholds.high_change_percent || occurrences >= thresholds.high_occurrences {
        if level < RiskLevel::High {
            level = RiskLevel::High;
        }
        if change_percentage >= thresholds.high_change_percent {
            factors.push(format!(
                "change affects {change_percentage:.1}% of the file (high threshold {:.0}%)",
                thresholds.high_change_percent
            ));
        }
        if occurrences >= thresholds.high_occurrences {
            factors.push(format!(
                "{occurrences} occurrences (high threshold {})",
                thresholds.high_occurrences
            ));
        }
    }
    if change_percentage >= thresholds.medium_change_percent || occurrences >= thresholds.medium_occurrences {
        if level < RiskLevel::Medium {
            level = RiskLevel::Medium;
        }
        if level == RiskLevel::Medium {
            if change_percentage >= thresholds.medium_change_percent {
                factors.push(format!(
                    "change affects {change_percentage:.1}% of the file (medium threshold {:.0}%)",
                    thresholds.medium_change_percent
                ));
            }
            if occurrences >= thresholds.medium_occurrences {
                factors.push(format!(
                    "{occurrences} occurrences (medium threshold {})",
                    thresholds.medium_occurrences
                ));
            }
        }
    }

    let is_risky = matches!(level, RiskLevel::High | RiskLevel::Critical);

    ChangeImpact {
        total_lines: content.lines().count(),
        occurrences,
        change_percentage,
        chars_changed,
        risk_level: level,
        is_risky,
        factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_risk_for_small_unique_change() {
        let content = "fn main() {\n    let x = old_name;\n}\n";
        let impact = assess(content, "old_name", "new_name", &RiskThresholds::default());
        assert_eq!(impact.occurrences, 1);
        assert_eq!(impact.risk_level, RiskLevel::Low);
        assert!(!impact.is_risky);
    }

    #[test]
    fn high_risk_from_occurrence_count() {
        let content = "x ".repeat(150);
        let impact = assess(&content, "x", "y", &RiskThresholds::default());
        assert!(impact.occurrences >= 100);
        assert!(impact.is_risky);
        assert_eq!(impact.risk_level, RiskLevel::High);
    }

    #[test]
    fn critical_when_change_dominates_file() {
        let content = "short";
        let new = "a very much longer replacement string indeed";
        let impact = assess(content, "short", new, &RiskThresholds::default());
        assert_eq!(impact.risk_level, RiskLevel::Critical);
        assert!(impact.change_percentage > 100.0 || impact.change_percentage >= 90.0);
    }

    #[test]
    fn zero_occurrences_is_low_risk() {
        let impact = assess("nothing matches here", "absent", "x", &RiskThresholds::default());
        assert_eq!(impact.occurrences, 0);
        assert_eq!(impact.risk_level, RiskLevel::Low);
    }
}
