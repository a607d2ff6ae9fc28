//! Line and character counting over a directory tree.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::ignore::IgnoreMatcher;

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupFileStats {
    pub lines: u64,
    pub characters: u64,
    pub files: u64,
    pub folders: u64,
    /// Some directory or file could not be read and was left out.
    pub has_unreachable_files: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("Invalid file path specified.")]
    InvalidPath,
    #[error("An unknown error has occurred: {0}")]
    Unexpected(String),
}

impl ScanError {
    pub fn code(&self) -> u8 {
        match self {
            ScanError::InvalidPath => 1,
            ScanError::Unexpected(_) => 0,
        }
    }
}

impl Serialize for ScanError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ScanError", 2)?;
        state.serialize_field("error", &true)?;
        state.serialize_field("code", &self.code())?;
        state.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Gitignore-style files at the root whose rules also exclude entries.
    pub ignore_files: Vec<String>,
}

pub fn lines_of_code(
    root: &Path,
    allowed_extensions: &[String],
    denied_globs: &[String],
) -> Result<GroupFileStats, ScanError> {
    scan(root, allowed_extensions, denied_globs, &ScanOptions::default())
}

/// Walks `root` with an explicit stack and totals every file whose name ends
/// with an allowed extension. Deny globs are matched case-insensitively
/// against the `/`-separated path relative to `root`; a denied directory is
/// not entered. Unreadable entries set `has_unreachable_files` instead of
/// failing the scan. Symlinked directories are neither entered nor counted as
/// folders; symlinked files are read through the link.
pub fn scan(
    root: &Path,
    allowed_extensions: &[String],
    denied_globs: &[String],
    options: &ScanOptions,
) -> Result<GroupFileStats, ScanError> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        _ => return Err(ScanError::InvalidPath),
    }

    let allowed: Vec<String> = allowed_extensions
        .iter()
        .map(|ext| ext.trim().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect();
    let denied = compile_globs(denied_globs);
    let ignore = if options.ignore_files.is_empty() {
        None
    } else {
        match IgnoreMatcher::new(root, &options.ignore_files) {
            Ok(matcher) => {
                tracing::debug!(loaded = matcher.sources().len(), "ignore files read");
                Some(matcher)
            }
            Err(err) => {
                tracing::warn!(error = %err, "ignore files skipped");
                None
            }
        }
    };

    let mut totals = GroupFileStats::default();
    let mut stack = vec![PathBuf::new()];

    while let Some(sub_path) = stack.pop() {
        let dir = root.join(&sub_path);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(path = %dir.display(), error = %err, "directory unreadable");
                totals.has_unreachable_files = true;
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(path = %dir.display(), error = %err, "entry unreadable");
                    totals.has_unreachable_files = true;
                    continue;
                }
            };
            let relative = sub_path.join(entry.file_name());
            let key = glob_key(&relative);
            if denied.iter().any(|glob| glob.matches_with(&key, GLOB_OPTIONS)) {
                continue;
            }

            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(_) => {
                    totals.has_unreachable_files = true;
                    continue;
                }
            };
            let is_dir = if file_type.is_symlink() {
                match fs::metadata(&path) {
                    Ok(target) if target.is_dir() => continue,
                    Ok(_) => false,
                    Err(_) => {
                        totals.has_unreachable_files = true;
                        continue;
                    }
                }
            } else {
                file_type.is_dir()
            };

            if let Some(matcher) = &ignore {
                if matcher.is_ignored(&relative, is_dir) {
                    continue;
                }
            }

            if is_dir {
                totals.folders += 1;
                stack.push(relative);
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_lowercase();
            if !allowed.iter().any(|ext| name.ends_with(ext.as_str())) {
                continue;
            }

            let mut file = match File::open(&path) {
                Ok(file) => file,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "file unreadable");
                    totals.has_unreachable_files = true;
                    continue;
                }
            };
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)
                .map_err(|err| ScanError::Unexpected(format!("{}: {err}", path.display())))?;

            let (lines, characters) = count_text(&bytes);
            totals.lines += lines;
            totals.characters += characters;
            totals.files += 1;
        }
    }

    tracing::debug!(
        root = %root.display(),
        files = totals.files,
        folders = totals.folders,
        lines = totals.lines,
        "scan finished"
    );
    Ok(totals)
}

fn compile_globs(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .map(|glob| glob.trim().to_lowercase())
        .filter(|glob| !glob.is_empty())
        .filter_map(|glob| match Pattern::new(&glob) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                tracing::warn!(glob = %glob, error = %err, "invalid deny glob skipped");
                None
            }
        })
        .collect()
}

/// Lowercased relative path joined with `/` on every platform.
fn glob_key(relative: &Path) -> String {
    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().to_lowercase()),
            _ => None,
        })
        .collect();
    parts.join("/")
}

/// Lines are newlines plus one for non-empty text; characters are Unicode
/// scalar values after lossy UTF-8 decoding, not UTF-16 code units, so a
/// character outside the Basic Multilingual Plane such as an emoji counts once
/// rather than twice.
fn count_text(bytes: &[u8]) -> (u64, u64) {
    if bytes.is_empty() {
        return (0, 0);
    }
    let text = String::from_utf8_lossy(bytes);
    let lines = text.matches('\n').count() as u64 + 1;
    let characters = text.chars().count() as u64;
    (lines, characters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exts(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn lines(count: usize) -> String {
        vec!["x"; count].join("\n")
    }

    #[test]
    fn counts_lines_and_characters() {
        assert_eq!(count_text(b""), (0, 0));
        assert_eq!(count_text(b"one"), (1, 3));
        assert_eq!(count_text(b"a\nb\n"), (3, 4));
        assert_eq!(count_text("héllo".as_bytes()), (1, 5));
    }

    #[test]
    fn missing_or_file_root_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = lines_of_code(&missing, &exts(&[".js"]), &[]).unwrap_err();
        assert_eq!(err, ScanError::InvalidPath);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({ "error": true, "code": 1 })
        );

        let file = dir.path().join("file.js");
        fs::write(&file, "x").unwrap();
        assert_eq!(
            lines_of_code(&file, &exts(&[".js"]), &[]),
            Err(ScanError::InvalidPath)
        );
    }

    #[test]
    fn walks_nested_folders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::write(root.join("main.js"), lines(10)).unwrap();
        fs::write(root.join("src/lib.JS"), lines(5)).unwrap();
        fs::write(root.join("src/nested/deep.ts"), lines(7)).unwrap();
        fs::write(root.join("src/readme.md"), lines(100)).unwrap();
        fs::write(root.join("src/empty.js"), "").unwrap();

        let stats = lines_of_code(root, &exts(&[".js", ".TS", ""]), &[]).unwrap();
        assert_eq!(stats.files, 4);
        assert_eq!(stats.folders, 2);
        assert_eq!(stats.lines, 22);
        assert_eq!(stats.characters, (19 + 9 + 13) as u64);
        assert!(!stats.has_unreachable_files);
    }

    #[test]
    fn denied_globs_skip_files_and_whole_folders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join("src/Generated")).unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), lines(50)).unwrap();
        fs::write(root.join("src/Generated/out.js"), lines(50)).unwrap();
        fs::write(root.join("src/app.js"), lines(3)).unwrap();
        fs::write(root.join("src/app.test.js"), lines(4)).unwrap();

        let stats = lines_of_code(
            root,
            &exts(&[".js"]),
            &exts(&["**/node_modules", "src/generated", "**/*.test.js", "[invalid"]),
        )
        .unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.folders, 1);
    }

    #[test]
    fn gitignore_rules_apply_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("dist")).unwrap();
        fs::write(root.join(".gitignore"), "dist/\n").unwrap();
        fs::write(root.join("dist/bundle.js"), lines(500)).unwrap();
        fs::write(root.join("index.js"), lines(2)).unwrap();

        let allowed = exts(&[".js"]);
        let plain = scan(root, &allowed, &[], &ScanOptions::default()).unwrap();
        assert_eq!(plain.lines, 502);

        let options = ScanOptions {
            ignore_files: vec![".gitignore".into()],
        };
        let filtered = scan(root, &allowed, &[], &options).unwrap();
        assert_eq!(filtered.lines, 2);
        assert_eq!(filtered.folders, 0);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_folder_is_flagged_not_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let locked = root.join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.js"), lines(99)).unwrap();
        fs::write(root.join("a.js"), lines(10)).unwrap();
        fs::write(root.join("b.js"), lines(20)).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let still_readable = fs::read_dir(&locked).is_ok();
        let stats = lines_of_code(root, &exts(&[".js"]), &[]);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if still_readable {
            eprintln!(
                "skipping unreadable_folder_is_flagged_not_fatal: permissions are not enforced for this user"
            );
            return;
        }

        let stats = stats.unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.folders, 1);
        assert_eq!(stats.lines, 30);
        assert!(stats.has_unreachable_files);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_entry_is_flagged_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.js"), lines(10)).unwrap();
        fs::write(root.join("b.js"), lines(20)).unwrap();
        std::os::unix::fs::symlink(root.join("removed"), root.join("gone")).unwrap();

        let stats = lines_of_code(root, &exts(&[".js"]), &[]).unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.folders, 0);
        assert_eq!(stats.lines, 30);
        assert!(stats.has_unreachable_files);
    }

    #[test]
    fn characters_are_unicode_scalars() {
        assert_eq!(count_text("héllo 🦀".as_bytes()), (1, 7));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_folders_are_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("real")).unwrap();
        fs::write(root.join("real/a.js"), lines(4)).unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();
        std::os::unix::fs::symlink(root.join("nowhere"), root.join("broken.js")).unwrap();

        let stats = lines_of_code(root, &exts(&[".js"]), &[]).unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.folders, 1);
        assert_eq!(stats.lines, 4);
        assert!(stats.has_unreachable_files);
    }
}
