//! Edit safety validation (C7) and the single-file Edit Pipeline (C8):
//! the `ERR_*` error taxonomy, tiered `old_text` matching and replacement,
//! line-ending preservation, per-path lock striping, and edit telemetry.

mod error;
mod lineending;
mod locks;
mod pipeline;
mod replace;
mod telemetry;
mod validator;

pub use error::CoreError;
pub use lineending::{apply as apply_line_ending, detect, dominant, to_lf, LineEnding};
pub use locks::{forget as forget_lock, lock_for};
pub use pipeline::{EditOutcome, EditPipeline, MultiEditOutcome, MultiEditStepOutcome};
pub use replace::{apply as apply_replacement, count_all_tiers, MatchMode, ReplaceError, ReplaceOutcome, ReplaceTier};
pub use telemetry::{EditKind, EditTelemetry, TelemetrySnapshot};
pub use validator::{validate, MatchTier, ValidationDiagnostics, ValidationOutcome};
