//! Path normalization and allow-list sandbox containment.
//!
//! A path accepted from a caller can arrive in Windows form (`C:\...`), WSL
//! form (`/mnt/c/...`, `\\wsl.localhost\<distro>\...`), or plain POSIX form.
//! [`normalize`] reconciles all three into the host's native canonical form;
//! [`Boundary`] then checks that the normalized path, with symlinks
//! resolved, is contained in a fixed allow-list of roots.
//!
//! The allow-list is immutable after [`Boundary::new`]; nothing in this
//! crate re-reads it from a mutable current-working-directory, since that
//! is precisely the manipulation this layer exists to prevent.

mod boundary;
mod env;
mod normalize;

pub use boundary::{Boundary, BoundaryCheck};
pub use env::{HostEnvironment, HostOs, detect_host_environment};
pub use normalize::{PathForm, detect_path_form, normalize};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while normalizing or authorizing a path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SandboxError {
    /// The input could not be interpreted as a path on any supported host form.
    #[error("path '{0}' is not a valid path")]
    InvalidPath(String),

    /// The resolved, canonical path is not contained in any allow-list root.
    #[error("path '{path}' is outside the allowed sandbox ({detail})")]
    OutsideSandbox { path: String, detail: String },

    /// A configured allow-list root itself could not be resolved.
    #[error("allow-list root '{0}' could not be resolved")]
    InvalidRoot(PathBuf),
}
