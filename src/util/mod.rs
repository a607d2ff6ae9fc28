use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use chrono::{DateTime, Local, Utc};
use directories::BaseDirs;

pub const DATA_DIR_ENV: &str = "DEVTALLY_DATA_DIR";

/// Picks the data directory: an explicit path first, then `DEVTALLY_DATA_DIR`,
/// then `~/.devtally`. The directory is created when missing.
pub fn resolve_data_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir,
        None => match std::env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => devtally_root()?,
        },
    };
    ensure_dir(&dir)?;
    Ok(dir)
}

pub fn devtally_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("failed to locate home directory")?;
    Ok(base.home_dir().join(".devtally"))
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory {}", path.display()))?;
    }
    Ok(())
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    let hash = hasher.finalize();
    hex::encode(hash.as_bytes())
}

/// Wall clock in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn format_timestamp(millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(ts) => ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => millis.to_string(),
    }
}

/// How [`plural`] forms the plural of a word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PluralKind {
    /// line -> lines
    #[default]
    S,
    /// tax -> taxes
    Es,
    /// bus -> busses
    DoubledEs,
}

/// Returns `word` unchanged when `amount` is exactly one.
pub fn plural(word: &str, amount: f64, kind: PluralKind) -> String {
    if amount == 1.0 {
        return word.to_string();
    }
    match kind {
        PluralKind::S => format!("{word}s"),
        PluralKind::Es => format!("{word}es"),
        PluralKind::DoubledEs => match word.chars().last() {
            Some(last) => format!("{word}{last}es"),
            None => "es".to_string(),
        },
    }
}

/// Human readable duration such as `2 hours, 5 minutes, and 3 seconds`.
///
/// Seconds are shown with `precision` decimals, rounding halves up. Negative
/// durations get an ` ago` suffix.
pub fn ms_to_time(time_ms: f64, precision: usize) -> String {
    let past = time_ms < 0.0;
    let time_ms = time_ms.abs();

    let hours = (time_ms / 3_600_000.0).floor();
    let minutes = (time_ms / 60_000.0).floor() % 60.0;
    let seconds = (time_ms / 1000.0) % 60.0;

    let mut parts = Vec::new();
    if hours > 0.0 {
        parts.push(format!("{hours} {}", plural("hour", hours, PluralKind::S)));
    }
    if minutes > 0.0 {
        parts.push(format!("{minutes} {}", plural("minute", minutes, PluralKind::S)));
    }
    if seconds > 0.0 {
        let factor = 10f64.powi(precision as i32);
        let shown = (seconds * factor).round() / factor;
        let amount = (seconds * 100.0).round() / 100.0;
        parts.push(format!(
            "{shown:.precision$} {}",
            plural("second", amount, PluralKind::S)
        ));
    }

    let mut text = match parts.len() {
        0 => return "0 seconds".to_string(),
        1 => parts.remove(0),
        _ => {
            let last = parts.pop().unwrap_or_default();
            format!("{}, and {last}", parts.join(", "))
        }
    };
    if past {
        text.push_str(" ago");
    }
    text
}
