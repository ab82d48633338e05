//! Allow-list containment checking.
//!
//! Security boundaries are anchored to a fixed set of roots established at
//! process start, never to the current working directory: an agent that
//! changes `cwd` mid-session must not be able to widen what it can touch.

use std::path::{Path, PathBuf};

use crate::SandboxError;

/// Result of a non-throwing containment check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryCheck {
    Allowed,
    Denied(String),
}

impl BoundaryCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, BoundaryCheck::Allowed)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, BoundaryCheck::Denied(_))
    }
}

/// Resolves the longest existing prefix of `path` and canonicalizes it,
/// then re-appends the components that do not exist yet. This lets a path
/// to a file that is about to be created still be checked for containment
/// (and still have any existing symlink prefix resolved).
fn canonicalize_best_effort(path: &Path) -> std::io::Result<PathBuf> {
    if let Ok(canon) = path.canonicalize() {
        return Ok(canon);
    }

    let mut existing = path.to_path_buf();
    let mut tail: Vec<std::ffi::OsString> = Vec::new();
    loop {
        if existing.as_os_str().is_empty() {
            return std::env::current_dir().map(|cwd| {
                tail.iter().rev().fold(cwd, |acc, c| acc.join(c))
            });
        }
        match existing.canonicalize() {
            Ok(canon) => {
                return Ok(tail.iter().rev().fold(canon, |acc, c| acc.join(c)));
            }
            Err(_) => {
                let popped = existing
                    .file_name()
                    .map(|n| n.to_os_string())
                    .ok_or_else(|| {
                        std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "no existing prefix found",
                        )
                    })?;
                tail.push(popped);
                if !existing.pop() {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "no existing prefix found",
                    ));
                }
            }
        }
    }
}

/// An immutable set of allow-listed roots, canonicalized once at construction.
#[derive(Debug, Clone)]
pub struct Boundary {
    roots: Vec<PathBuf>,
}

impl Boundary {
    /// Build a boundary from a non-empty list of root paths. Every root is
    /// canonicalized eagerly so later checks never re-resolve them.
    pub fn new(roots: Vec<PathBuf>) -> Result<Self, SandboxError> {
        if roots.is_empty() {
            return Err(SandboxError::InvalidPath(
                "allow-list must contain at least one root".to_string(),
            ));
        }
        let mut canonical_roots = Vec::with_capacity(roots.len());
        for root in &roots {
            let canonical = root
                .canonicalize()
                .map_err(|_| SandboxError::InvalidRoot(root.clone()))?;
            canonical_roots.push(canonical);
        }
        Ok(Self {
            roots: canonical_roots,
        })
    }

    /// The canonicalized allow-list roots.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Resolve symlinks along `path` (walking the longest existing prefix)
    /// and check containment against the allow-list. Containment is
    /// component-wise (`Path::starts_with`), not string-prefix, so
    /// `/allowed-evil` never matches a root of `/allowed`.
    pub fn validate(&self, path: &Path) -> Result<PathBuf, SandboxError> {
        let resolved = canonicalize_best_effort(path).map_err(|e| {
            SandboxError::InvalidPath(format!("cannot resolve '{}': {e}", path.display()))
        })?;

        if self.roots.iter().any(|root| resolved.starts_with(root)) {
            return Ok(resolved);
        }

        Err(SandboxError::OutsideSandbox {
            path: path.display().to_string(),
            detail: format!(
                "resolved to '{}', which is not under any of {} allowed root(s)",
                resolved.display(),
                self.roots.len()
            ),
        })
    }

    /// Non-throwing variant of [`Boundary::validate`].
    pub fn check(&self, path: &Path) -> BoundaryCheck {
        match self.validate(path) {
            Ok(_) => BoundaryCheck::Allowed,
            Err(e) => BoundaryCheck::Denied(e.to_string()),
        }
    }

    /// Validate every path in `paths`, short-circuiting on the first failure.
    pub fn validate_all(&self, paths: &[&Path]) -> Result<(), SandboxError> {
        for path in paths {
            self.validate(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn allows_path_under_root() {
        let tmp = tempfile::tempdir().unwrap();
        let sub = tmp.path().join("sub");
        fs::create_dir_all(&sub).unwrap();

        let boundary = Boundary::new(vec![tmp.path().to_path_buf()]).unwrap();
        assert!(boundary.check(&sub).is_allowed());
    }

    #[test]
    fn denies_sibling_with_prefix_collision() {
        let tmp = tempfile::tempdir().unwrap();
        let allowed = tmp.path().join("allowed");
        let evil = tmp.path().join("allowed-evil");
        fs::create_dir_all(&allowed).unwrap();
        fs::create_dir_all(&evil).unwrap();

        let boundary = Boundary::new(vec![allowed.clone()]).unwrap();
        assert!(boundary.check(&evil).is_denied());
    }

    #[test]
    fn allows_not_yet_created_file_under_root() {
        let tmp = tempfile::tempdir().unwrap();
        let boundary = Boundary::new(vec![tmp.path().to_path_buf()]).unwrap();
        let not_yet = tmp.path().join("new.txt");
        assert!(boundary.check(&not_yet).is_allowed());
    }

    #[test]
    fn denies_path_outside_all_roots() {
        let tmp = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let boundary = Boundary::new(vec![tmp.path().to_path_buf()]).unwrap();
        assert!(boundary.check(other.path()).is_denied());
    }

    #[test]
    fn rejects_empty_allow_list() {
        assert!(Boundary::new(Vec::new()).is_err());
    }
}
