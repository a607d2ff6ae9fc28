use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::scan::ScanOptions;
use crate::stats::StatCounterSearch;
use crate::usage::RollOverPolicy;

pub const CONFIG_FILE: &str = "config.json";
pub const SAVE_INTERVAL_ENV: &str = "DEVTALLY_SAVE_INTERVAL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Minimum seconds between unforced saves; 0 turns them off.
    pub save_interval_secs: i64,
    pub track_stats: bool,
    pub default_allowed_extensions: Vec<String>,
    pub default_excluded_globs: Vec<String>,
    pub respect_gitignore: bool,
    pub respect_vscodeignore: bool,
    pub today_reset_ms: i64,
    pub weekly_reset_ms: i64,
    pub reset_grace_ms: i64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let policy = RollOverPolicy::default();
        Self {
            save_interval_secs: 15,
            track_stats: true,
            default_allowed_extensions: vec![
                ".js".into(),
                ".ts".into(),
                ".jsx".into(),
                ".tsx".into(),
                ".rs".into(),
                ".py".into(),
                ".go".into(),
            ],
            default_excluded_globs: vec![
                "**/node_modules".into(),
                "**/.git".into(),
                "**/target".into(),
            ],
            respect_gitignore: false,
            respect_vscodeignore: false,
            today_reset_ms: policy.today_period_ms,
            weekly_reset_ms: policy.weekly_period_ms,
            reset_grace_ms: policy.grace_ms,
        }
    }
}

impl TrackerConfig {
    /// Reads `config.json` from the data directory (defaults when absent)
    /// and applies environment overrides.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let file =
                File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
            serde_json::from_reader(file)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup(SAVE_INTERVAL_ENV) {
            self.save_interval_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{SAVE_INTERVAL_ENV} must be a whole number, got `{raw}`"))?;
        }
        Ok(())
    }

    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_secs.max(0) as u64)
    }

    pub fn roll_over_policy(&self) -> RollOverPolicy {
        RollOverPolicy {
            today_period_ms: self.today_reset_ms,
            weekly_period_ms: self.weekly_reset_ms,
            grace_ms: self.reset_grace_ms,
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        let mut ignore_files = Vec::new();
        if self.respect_gitignore {
            ignore_files.push(".gitignore".to_string());
        }
        if self.respect_vscodeignore {
            ignore_files.push(".vscodeignore".to_string());
        }
        ScanOptions { ignore_files }
    }

    /// The allowed extensions and excluded globs to scan a project with.
    pub fn search_filters(&self, search: &StatCounterSearch) -> (Vec<String>, Vec<String>) {
        if search.is_default_ia {
            (
                self.default_allowed_extensions.clone(),
                self.default_excluded_globs.clone(),
            )
        } else {
            (
                search.allowed_file_extensions.clone(),
                search.ignored_file_folder_names.clone(),
            )
        }
    }
}
