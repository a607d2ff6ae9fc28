use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::counters::{Edits, TimeAllocation};
use super::language::LanguageCollection;
use super::partial;

pub const UNKNOWN_PROJECT_PATH: &str = "/unknown";
pub const MAX_PROJECT_NAME_LEN: usize = 256;

/// Stats for one project folder inside a time window. `path` is the identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct ProjectStats {
    pub path: String,
    pub time: TimeAllocation,
    pub edits: Edits,
    pub languages: LanguageCollection,
}

impl ProjectStats {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Older snapshots stored the time under `timeAllocation`.
    pub fn from_partial(value: &Value) -> Self {
        let path = partial::string(value.get("path"))
            .filter(|path| !path.is_empty())
            .unwrap_or(UNKNOWN_PROJECT_PATH);
        let time = value
            .get("time")
            .filter(|time| time.is_object())
            .or_else(|| value.get("timeAllocation"))
            .map(TimeAllocation::from_partial)
            .unwrap_or_default();
        Self {
            path: path.to_string(),
            time,
            edits: value
                .get("edits")
                .map(Edits::from_partial)
                .unwrap_or_default(),
            languages: value
                .get("languages")
                .map(LanguageCollection::from_partial)
                .unwrap_or_default(),
        }
    }

    pub fn combine(&mut self, other: &ProjectStats, replace_path: bool) {
        if replace_path {
            self.path = other.path.clone();
        }
        self.time.combine(&other.time);
        self.edits.combine(&other.edits);
        self.languages.combine(&other.languages);
    }
}

impl From<Value> for ProjectStats {
    fn from(value: Value) -> Self {
        Self::from_partial(&value)
    }
}

/// Last segment of a folder path, ignoring one trailing delimiter. Paths that
/// contain a `/` anywhere are split on `/`, everything else on `\`.
pub fn folder_from_path(path: &str) -> &str {
    let delim = if path.contains('/') { '/' } else { '\\' };
    let trimmed = path.strip_suffix(delim).unwrap_or(path);
    match trimmed.rfind(delim) {
        Some(index) => &trimmed[index + delim.len_utf8()..],
        None => trimmed,
    }
}

/// Scan filters remembered for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", rename_all = "camelCase")]
pub struct StatCounterSearch {
    pub path: String,
    pub allowed_file_extensions: Vec<String>,
    pub ignored_file_folder_names: Vec<String>,
    /// The filters are still the configured defaults and may be replaced.
    #[serde(rename = "isDefaultIA")]
    pub is_default_ia: bool,
}

impl Default for StatCounterSearch {
    fn default() -> Self {
        Self {
            path: String::new(),
            allowed_file_extensions: Vec::new(),
            ignored_file_folder_names: Vec::new(),
            is_default_ia: true,
        }
    }
}

impl StatCounterSearch {
    pub fn from_partial(value: &Value) -> Self {
        Self {
            path: partial::string(value.get("path"))
                .unwrap_or_default()
                .to_string(),
            allowed_file_extensions: partial::string_list(value.get("allowedFileExtensions")),
            ignored_file_folder_names: partial::string_list(value.get("ignoredFileFolderNames")),
            is_default_ia: value
                .get("isDefaultIA")
                .and_then(Value::as_bool)
                .unwrap_or(true),
        }
    }
}

impl From<Value> for StatCounterSearch {
    fn from(value: Value) -> Self {
        Self::from_partial(&value)
    }
}

/// Display metadata for a project, shared by every time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct ProjectStatsInfo {
    pub name: String,
    pub path: String,
    pub search: StatCounterSearch,
}

impl ProjectStatsInfo {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: capped_name(folder_from_path(&path)),
            path,
            search: StatCounterSearch::default(),
        }
    }

    pub fn from_partial(value: &Value) -> Self {
        let path = partial::string(value.get("path")).unwrap_or(UNKNOWN_PROJECT_PATH);
        let name = partial::string(value.get("name")).unwrap_or_else(|| folder_from_path(path));
        Self {
            name: capped_name(name),
            path: path.to_string(),
            search: value
                .get("search")
                .map(StatCounterSearch::from_partial)
                .unwrap_or_default(),
        }
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = capped_name(name);
    }
}

impl From<Value> for ProjectStatsInfo {
    fn from(value: Value) -> Self {
        Self::from_partial(&value)
    }
}

fn capped_name(name: &str) -> String {
    name.chars().take(MAX_PROJECT_NAME_LEN).collect()
}
