//! One-shot host environment detection.
//!
//! Detection runs once per process and is cached in a [`once_cell::sync::OnceCell`];
//! nothing in this crate re-probes the host after the first call, matching
//! the process-lifetime caching the path normalizer depends on.

use once_cell::sync::OnceCell;

/// Coarse host operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Linux,
    Macos,
}

/// Result of one-shot environment detection.
#[derive(Debug, Clone)]
pub struct HostEnvironment {
    pub os: HostOs,
    /// True when running inside a WSL instance (Linux kernel reporting
    /// "microsoft" in its release string).
    pub is_wsl: bool,
    /// Default WSL distribution name, discovered by calling the WSL control
    /// binary. `None` on non-Windows hosts or if discovery failed; callers
    /// fall back to returning the input path unchanged in that case.
    pub default_wsl_distro: Option<String>,
}

static HOST_ENV: OnceCell<HostEnvironment> = OnceCell::new();

/// Detect (once) and return the current host environment.
pub fn detect_host_environment() -> &'static HostEnvironment {
    HOST_ENV.get_or_init(|| HostEnvironment {
        os: current_os(),
        is_wsl: detect_is_wsl(),
        default_wsl_distro: discover_default_wsl_distro(),
    })
}

fn current_os() -> HostOs {
    if cfg!(target_os = "windows") {
        HostOs::Windows
    } else if cfg!(target_os = "macos") {
        HostOs::Macos
    } else {
        HostOs::Linux
    }
}

fn detect_is_wsl() -> bool {
    if !cfg!(target_os = "linux") {
        return false;
    }
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|release| release.to_lowercase().contains("microsoft"))
        .unwrap_or(false)
}

/// Discover the default WSL distribution by invoking `wsl.exe -l -q`.
/// Only meaningful on a Windows host; returns `None` everywhere else or on
/// any failure, so callers must treat a `None` as "leave the path alone".
#[cfg(target_os = "windows")]
fn discover_default_wsl_distro() -> Option<String> {
    use std::process::Command;

    let output = Command::new("wsl.exe").args(["-l", "-q"]).output().ok()?;
    if !output.status.success() {
        return None;
    }

    // wsl.exe emits UTF-16LE on stock Windows consoles.
    let text = decode_wsl_output(&output.stdout);
    text.lines()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .map(|l| l.to_string())
}

#[cfg(target_os = "windows")]
fn decode_wsl_output(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes.chunks(2).count() * 2 == bytes.len() {
        let utf16: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        if let Ok(s) = String::from_utf16(&utf16) {
            return s;
        }
    }
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(not(target_os = "windows"))]
fn discover_default_wsl_distro() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_is_cached_across_calls() {
        let a = detect_host_environment() as *const HostEnvironment;
        let b = detect_host_environment() as *const HostEnvironment;
        assert_eq!(a, b);
    }
}
