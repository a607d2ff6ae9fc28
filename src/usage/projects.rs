use thiserror::Error;

use super::UsageTime;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    #[error("invalid project path: {0}")]
    InvalidProjectPath(String),
    #[error("no project paths given")]
    NoProjectPaths,
    #[error("cannot merge project {0} into itself")]
    SelfMerge(String),
}

impl UsageTime {
    /// Folds every project in `sources` into `kept`, in every window, then
    /// forgets the sources' metadata. Nothing is touched unless all sources
    /// are known projects.
    pub fn merge_projects<S: AsRef<str>>(
        &mut self,
        kept: &str,
        sources: &[S],
    ) -> Result<(), ProjectError> {
        if kept.is_empty() {
            return Err(ProjectError::InvalidProjectPath(kept.to_string()));
        }
        if sources.is_empty() {
            return Err(ProjectError::NoProjectPaths);
        }

        let mut unique: Vec<&str> = Vec::with_capacity(sources.len());
        for source in sources {
            let source: &str = source.as_ref();
            if source == kept {
                return Err(ProjectError::SelfMerge(source.to_string()));
            }
            if !self.project_info.contains_key(source) {
                return Err(ProjectError::InvalidProjectPath(source.to_string()));
            }
            if !unique.contains(&source) {
                unique.push(source);
            }
        }

        self.get_current_project_info(kept, true);
        for range in self.ranges_mut() {
            for source in &unique {
                range.merge_project(kept, source);
            }
        }
        for source in &unique {
            self.project_info.remove(*source);
        }
        tracing::info!(kept, merged = unique.len(), "projects merged");
        Ok(())
    }

    pub fn rename_project(&mut self, path: &str, name: &str) -> Result<(), ProjectError> {
        let info = self
            .get_current_project_info(path, false)
            .ok_or_else(|| ProjectError::InvalidProjectPath(path.to_string()))?;
        info.set_name(name);
        Ok(())
    }

    /// Stores explicit scan filters for a project. The filters stop tracking
    /// the configured defaults from then on.
    pub fn update_search(
        &mut self,
        path: &str,
        allowed_file_extensions: Vec<String>,
        ignored_file_folder_names: Vec<String>,
    ) -> Result<(), ProjectError> {
        let info = self
            .get_current_project_info(path, true)
            .ok_or_else(|| ProjectError::InvalidProjectPath(path.to_string()))?;
        info.search.path = path.to_string();
        info.search.allowed_file_extensions = allowed_file_extensions;
        info.search.ignored_file_folder_names = ignored_file_folder_names;
        info.search.is_default_ia = false;
        Ok(())
    }
}
