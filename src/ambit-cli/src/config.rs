//! Process-level configuration: CLI flags layered over an optional TOML
//! file, covering every option in the tool's configuration surface (sandbox
//! roots, backup retention, risk thresholds, I/O tiers, response limits).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Raw, all-optional shape of the TOML config file. Every field falls back
/// to the documented default when absent.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    allowed_paths: Option<Vec<PathBuf>>,
    backup_dir: Option<PathBuf>,
    backup_max_age_days: Option<u64>,
    backup_max_count: Option<usize>,
    risk_threshold_medium: Option<f64>,
    risk_threshold_high: Option<f64>,
    risk_threshold_critical: Option<f64>,
    risk_occurrences_medium: Option<usize>,
    risk_occurrences_high: Option<usize>,
    parallel_ops: Option<usize>,
    cache_size: Option<u64>,
    small_file_threshold: Option<u64>,
    medium_file_threshold: Option<u64>,
    large_file_threshold: Option<u64>,
    max_search_results: Option<usize>,
    max_list_items: Option<usize>,
}

/// Fully resolved process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub allowed_paths: Vec<PathBuf>,
    pub backup_dir: PathBuf,
    pub backup_max_age_days: u64,
    pub backup_max_count: usize,
    pub risk_threshold_medium: f64,
    pub risk_threshold_high: f64,
    pub risk_threshold_critical: f64,
    pub risk_occurrences_medium: usize,
    pub risk_occurrences_high: usize,
    pub parallel_ops: usize,
    pub cache_size: u64,
    pub small_file_threshold: u64,
    pub medium_file_threshold: u64,
    pub large_file_threshold: u64,
    pub max_search_results: usize,
    pub max_list_items: usize,
}

impl Config {
    /// Load the TOML file at `path`, then apply CLI overrides on top.
    /// `cli_allowed_paths`, when non-empty, replaces whatever the file
    /// declares (the caller's explicit `--allow` flags win).
    pub fn load(path: Option<&Path>, cli_allowed_paths: &[PathBuf]) -> Result<Self> {
        let file = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file '{}'", path.display()))?;
                toml::from_str(&raw).with_context(|| format!("parsing config file '{}'", path.display()))?
            }
            None => FileConfig::default(),
        };

        let allowed_paths = if !cli_allowed_paths.is_empty() {
            cli_allowed_paths.to_vec()
        } else {
            file.allowed_paths.unwrap_or_default()
        };
        if allowed_paths.is_empty() {
            bail!("allowed_paths must be non-empty: pass --allow <path> or set allowed_paths in the config file");
        }

        let backup_dir = file.backup_dir.unwrap_or_else(ambit_backup::default_backup_root);
        if !allowed_paths.iter().any(|root| backup_dir.starts_with(root)) {
            bail!(
                "backup_dir '{}' must be inside one of the allowed_paths entries",
                backup_dir.display()
            );
        }

        Ok(Self {
            allowed_paths,
            backup_dir,
            backup_max_age_days: file.backup_max_age_days.unwrap_or(ambit_backup::DEFAULT_MAX_AGE_DAYS),
            backup_max_count: file.backup_max_count.unwrap_or(ambit_backup::DEFAULT_MAX_COUNT),
            risk_threshold_medium: file.risk_threshold_medium.unwrap_or(30.0),
            risk_threshold_high: file.risk_threshold_high.unwrap_or(50.0),
            risk_threshold_critical: file.risk_threshold_critical.unwrap_or(90.0),
            risk_occurrences_medium: file.risk_occurrences_medium.unwrap_or(50),
            risk_occurrences_high: file.risk_occurrences_high.unwrap_or(100),
            parallel_ops: file.parallel_ops.unwrap_or_else(num_cpus_default),
            cache_size: file.cache_size.unwrap_or(ambit_cache::DEFAULT_CAPACITY_BYTES),
            small_file_threshold: file.small_file_threshold.unwrap_or(100 * 1024),
            medium_file_threshold: file.medium_file_threshold.unwrap_or(500 * 1024),
            large_file_threshold: file.large_file_threshold.unwrap_or(5 * 1024 * 1024),
            max_search_results: file.max_search_results.unwrap_or(200),
            max_list_items: file.max_list_items.unwrap_or(100),
        })
    }

    pub fn risk_thresholds(&self) -> ambit_risk::RiskThresholds {
        ambit_risk::RiskThresholds {
            medium_change_percent: self.risk_threshold_medium,
            high_change_percent: self.risk_threshold_high,
            critical_change_percent: self.risk_threshold_critical,
            medium_occurrences: self.risk_occurrences_medium,
            high_occurrences: self.risk_occurrences_high,
        }
    }

    pub fn io_thresholds(&self) -> ambit_io::IoThresholds {
        ambit_io::IoThresholds {
            small: self.small_file_threshold,
            medium: self.medium_file_threshold,
            large: self.large_file_threshold,
        }
    }

    pub fn response_limits(&self) -> ambit_mcp_tools::ResponseLimits {
        ambit_mcp_tools::ResponseLimits {
            max_search_results: self.max_search_results,
            max_list_items: self.max_list_items,
        }
    }
}

fn num_cpus_default() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_allowed_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "").unwrap();
        assert!(Config::load(Some(&config_path), &[]).is_err());
    }

    #[test]
    fn cli_allow_overrides_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        let backup_dir = tmp.path().join("backups");
        std::fs::write(
            &config_path,
            format!("allowed_paths = [\"/tmp/from-file\"]\nbackup_dir = \"{}\"\n", backup_dir.display()),
        )
        .unwrap();

        let config = Config::load(Some(&config_path), std::slice::from_ref(&tmp.path().to_path_buf())).unwrap();
        assert_eq!(config.allowed_paths, vec![tmp.path().to_path_buf()]);
    }

    #[test]
    fn backup_dir_defaults_under_allowed_root() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(None, std::slice::from_ref(&tmp.path().to_path_buf()));
        // Default backup root lives under the OS data dir, not under an
        // arbitrary tempdir allow-list, so this is expected to fail closed
        // rather than silently picking an unauthorized location.
        assert!(config.is_err());
    }
}
