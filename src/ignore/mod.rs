use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::Match;

/// Gitignore-style rules read from ignore files at the root of a scan, such
/// as `.gitignore`. Missing files are skipped.
#[derive(Clone)]
pub struct IgnoreMatcher {
    matcher: Gitignore,
    sources: Vec<PathBuf>,
}

impl IgnoreMatcher {
    pub fn new(root: &Path, ignore_files: &[String]) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(root);
        let mut sources = Vec::new();
        for name in ignore_files {
            let file = root.join(name);
            if !file.is_file() {
                continue;
            }
            if let Some(err) = builder.add(&file) {
                return Err(anyhow!("failed to parse {}: {}", file.display(), err));
            }
            sources.push(file);
        }
        let matcher = builder
            .build()
            .map_err(|err| anyhow!("failed to build ignore matcher: {err}"))?;
        Ok(Self { matcher, sources })
    }

    /// `path` is relative to the scan root.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        match self.matcher.matched_path_or_any_parents(path, is_dir) {
            Match::None | Match::Whitelist(_) => false,
            Match::Ignore(_) => true,
        }
    }

    /// Ignore files that were found and loaded.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}
