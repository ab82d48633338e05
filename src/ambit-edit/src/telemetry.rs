//! Edit telemetry: process-lifetime counters over every edit the pipeline
//! performs, surfaced through `analyze_edit`/server status tooling rather
//! than logged per-call.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Whether an edit touched a bounded span of the file (`edit_file`,
/// `multi_edit`, `replace_nth_occurrence`) or replaced the file wholesale
/// (`write_file` over existing content).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Targeted,
    FullRewrite,
}

#[derive(Debug, Default)]
pub struct EditTelemetry {
    total_edits: AtomicU64,
    targeted_edits: AtomicU64,
    full_rewrites: AtomicU64,
    total_bytes_written: AtomicU64,
}

/// Point-in-time snapshot of `EditTelemetry`'s counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TelemetrySnapshot {
    pub total_edits: u64,
    pub targeted_edits: u64,
    pub full_rewrites: u64,
    pub total_bytes_written: u64,
    pub average_bytes_per_edit: u64,
}

impl EditTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: EditKind, bytes_written: u64) {
        self.total_edits.fetch_add(1, Ordering::Relaxed);
        match kind {
            EditKind::Targeted => {
                self.targeted_edits.fetch_add(1, Ordering::Relaxed);
            }
            EditKind::FullRewrite => {
                self.full_rewrites.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.total_bytes_written.fetch_add(bytes_written, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let total_edits = self.total_edits.load(Ordering::Relaxed);
        let total_bytes_written = self.total_bytes_written.load(Ordering::Relaxed);
        let average_bytes_per_edit = if total_edits == 0 {
            0
        } else {
            total_bytes_written / total_edits
        };
        TelemetrySnapshot {
            total_edits,
            targeted_edits: self.targeted_edits.load(Ordering::Relaxed),
            full_rewrites: self.full_rewrites.load(Ordering::Relaxed),
            total_bytes_written,
            average_bytes_per_edit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let telemetry = EditTelemetry::new();
        let snap = telemetry.snapshot();
        assert_eq!(snap.total_edits, 0);
        assert_eq!(snap.average_bytes_per_edit, 0);
    }

    #[test]
    fn tracks_targeted_and_full_rewrite_counts() {
        let telemetry = EditTelemetry::new();
        telemetry.record(EditKind::Targeted, 100);
        telemetry.record(EditKind::Targeted, 300);
        telemetry.record(EditKind::FullRewrite, 1000);

        let snap = telemetry.snapshot();
        assert_eq!(snap.total_edits, 3);
        assert_eq!(snap.targeted_edits, 2);
        assert_eq!(snap.full_rewrites, 1);
        assert_eq!(snap.total_bytes_written, 1400);
        assert_eq!(snap.average_bytes_per_edit, 466);
    }
}
