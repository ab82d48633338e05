//! Pipeline Executor (C11): a named, ordered list of steps -- search,
//! read, edit, multi-edit, count, regex-transform, copy, rename, delete --
//! where a step may draw its working set from an earlier step's result.
//! Composes the sandbox boundary, search, edit, and backup layers rather
//! than reimplementing their safety checks.

mod executor;
mod result;
mod step;
mod validate;

pub use executor::PipelineExecutor;
pub use result::{PipelineReport, StepResult};
pub use step::{EditPair, Pipeline, PipelineStep, StepAction, MAX_FILES_TOUCHED, MAX_STEPS};
pub use validate::validate;
