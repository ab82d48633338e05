//! WSL / Windows / POSIX path form detection and conversion.
//!
//! `normalize` is deterministic and idempotent: feeding its own output back
//! in produces the same path, because the output is always expressed in the
//! *current host's* native form, and `detect_path_form` classifies a
//! native-form path as needing no further conversion.

use std::path::{Path, PathBuf};

use path_absolutize::Absolutize;

use crate::env::{HostOs, detect_host_environment};
use crate::SandboxError;

/// The form an input path string was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathForm {
    /// `C:\...` or `C:/...` or a Windows UNC share `\\server\share\...`.
    Windows,
    /// `/mnt/c/...` or `\\wsl.localhost\<distro>\...`.
    Wsl,
    /// Anything else: plain POSIX, relative, or already-native.
    Posix,
}

fn is_drive_letter_form(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}

fn is_windows_unc(s: &str) -> bool {
    s.starts_with(r"\\") && !s.to_lowercase().starts_with(r"\\wsl.localhost\")
        && !s.to_lowercase().starts_with(r"\\wsl$\")
}

fn is_wsl_mount_form(s: &str) -> bool {
    let lower = s.to_lowercase();
    if !lower.starts_with("/mnt/") {
        return false;
    }
    let rest = &lower["/mnt/".len()..];
    rest.as_bytes()
        .first()
        .is_some_and(u8::is_ascii_alphabetic)
        && rest.as_bytes().get(1).is_none_or(|&b| b == b'/')
}

fn is_wsl_unc_form(s: &str) -> bool {
    let lower = s.to_lowercase();
    lower.starts_with(r"\\wsl.localhost\") || lower.starts_with(r"\\wsl$\")
}

/// Classify the form a path string was written in.
pub fn detect_path_form(input: &str) -> PathForm {
    if is_wsl_mount_form(input) || is_wsl_unc_form(input) {
        PathForm::Wsl
    } else if is_drive_letter_form(input) || is_windows_unc(input) {
        PathForm::Windows
    } else {
        PathForm::Posix
    }
}

fn wsl_mount_to_windows(input: &str) -> Option<PathBuf> {
    if !is_wsl_mount_form(input) {
        return None;
    }
    // Only the `/mnt/<drive>` prefix is matched case-insensitively; the
    // remainder is sliced from `input` itself so the original case of the
    // path tail is preserved.
    let rest = &input[5..]; // skip "/mnt/"
    let drive = rest.chars().next()?;
    if !drive.is_ascii_alphabetic() {
        return None;
    }
    let remainder = &rest[1..];
    let remainder = remainder.strip_prefix('/').unwrap_or(remainder);
    let windows_tail = remainder.replace('/', "\\");
    let drive_upper = drive.to_ascii_uppercase();
    if windows_tail.is_empty() {
        Some(PathBuf::from(format!("{drive_upper}:\\")))
    } else {
        Some(PathBuf::from(format!("{drive_upper}:\\{windows_tail}")))
    }
}

fn windows_to_wsl_mount(input: &str) -> Option<PathBuf> {
    if !is_drive_letter_form(input) {
        return None;
    }
    let drive = input.chars().next()?.to_ascii_lowercase();
    let rest = &input[2..]; // skip "C:"
    let rest = rest.trim_start_matches(['/', '\\']);
    let posix_tail = rest.replace('\\', "/");
    if posix_tail.is_empty() {
        Some(PathBuf::from(format!("/mnt/{drive}")))
    } else {
        Some(PathBuf::from(format!("/mnt/{drive}/{posix_tail}")))
    }
}

fn posix_to_wsl_unc(input: &str, distro: &str) -> PathBuf {
    let windows_tail = input.trim_start_matches('/').replace('/', "\\");
    PathBuf::from(format!(r"\\wsl.localhost\{distro}\{windows_tail}"))
}

fn make_absolute(path: &Path) -> Result<PathBuf, SandboxError> {
    path.absolutize()
        .map(|p| p.into_owned())
        .map_err(|e| SandboxError::InvalidPath(format!("cannot absolutize '{}': {e}", path.display())))
}

/// Normalize `input` to the current host's native absolute path form.
///
/// * On a Windows host: a WSL-mount path (`/mnt/c/x`) becomes `C:\x`; a
///   plain POSIX path (`/home/u/x`) becomes
///   `\\wsl.localhost\<default_distro>\home\u\x`, using the distro
///   discovered once at process start. If no default distro could be
///   discovered, the input is returned unchanged (as an absolute path on the
///   current drive) so the OS produces a meaningful error downstream rather
///   than this layer guessing.
/// * On a POSIX/WSL host: a Windows drive-letter path (`C:\x`) becomes
///   `/mnt/c/x`.
/// * Anything already in the host's native form passes through unchanged
///   (after being made absolute), which is what makes the function
///   idempotent.
pub fn normalize(input: &str) -> Result<PathBuf, SandboxError> {
    if input.is_empty() {
        return Err(SandboxError::InvalidPath("empty path".to_string()));
    }
    if input.contains('\0') {
        return Err(SandboxError::InvalidPath(
            "path contains a NUL byte".to_string(),
        ));
    }

    let env = detect_host_environment();
    let form = detect_path_form(input);

    let converted = match (env.os, form) {
        (HostOs::Windows, PathForm::Wsl) => {
            wsl_mount_to_windows(input).unwrap_or_else(|| PathBuf::from(input))
        }
        (HostOs::Windows, PathForm::Posix) => match &env.default_wsl_distro {
            Some(distro) => posix_to_wsl_unc(input, distro),
            None => {
                tracing::warn!(
                    "no default WSL distro discovered; returning POSIX-form path unchanged"
                );
                PathBuf::from(input)
            }
        },
        (HostOs::Windows, PathForm::Windows) => PathBuf::from(input),
        (HostOs::Linux | HostOs::Macos, PathForm::Windows) => {
            windows_to_wsl_mount(input).unwrap_or_else(|| PathBuf::from(input))
        }
        (HostOs::Linux | HostOs::Macos, PathForm::Wsl | PathForm::Posix) => PathBuf::from(input),
    };

    make_absolute(&converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_drive_letter_form() {
        assert_eq!(detect_path_form(r"C:\Users\x"), PathForm::Windows);
        assert_eq!(detect_path_form("C:/Users/x"), PathForm::Windows);
    }

    #[test]
    fn detects_wsl_mount_form() {
        assert_eq!(detect_path_form("/mnt/c/Users/x"), PathForm::Wsl);
    }

    #[test]
    fn detects_wsl_unc_form() {
        assert_eq!(
            detect_path_form(r"\\wsl.localhost\Ubuntu\home\x"),
            PathForm::Wsl
        );
    }

    #[test]
    fn detects_posix_form() {
        assert_eq!(detect_path_form("/home/user/project"), PathForm::Posix);
        assert_eq!(detect_path_form("relative/path"), PathForm::Posix);
    }

    #[test]
    fn wsl_mount_converts_to_windows_drive() {
        assert_eq!(
            wsl_mount_to_windows("/mnt/c/Users/x"),
            Some(PathBuf::from(r"C:\Users\x"))
        );
    }

    #[test]
    fn windows_drive_converts_to_wsl_mount() {
        assert_eq!(
            windows_to_wsl_mount(r"C:\Users\x"),
            Some(PathBuf::from("/mnt/c/Users/x"))
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert!(normalize("").is_err());
    }

    #[test]
    fn rejects_nul_byte() {
        assert!(normalize("/tmp/has\0nul").is_err());
    }
}
