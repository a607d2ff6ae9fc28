use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::counters::{Edits, TimeAllocation};
use super::language::LanguageCollection;
use super::partial;
use super::project::{ProjectStats, ProjectStatsInfo};
use super::typing::TypingStats;

/// One accumulation window. `projects` is kept most-recently-touched first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    /// Epoch milliseconds at which the window should roll over.
    pub resets: i64,
    pub code_time: TimeAllocation,
    pub edits: Edits,
    pub languages: LanguageCollection,
    pub typing: TypingStats,
    pub projects: Vec<ProjectStats>,
}

impl TimeRange {
    pub fn new(resets: i64) -> Self {
        Self {
            resets,
            code_time: TimeAllocation::default(),
            edits: Edits::default(),
            languages: LanguageCollection::new(),
            typing: TypingStats::new(),
            projects: Vec::new(),
        }
    }

    /// `default_resets` is used when the record carries no usable `resets`.
    pub fn from_partial(value: &Value, default_resets: i64) -> Self {
        let projects = match value.get("projects") {
            Some(Value::Array(items)) => items.iter().map(ProjectStats::from_partial).collect(),
            _ => Vec::new(),
        };
        Self {
            resets: value
                .get("resets")
                .filter(|resets| !resets.is_null())
                .and_then(|resets| partial::count(Some(resets)))
                .unwrap_or(default_resets),
            code_time: value
                .get("codeTime")
                .map(TimeAllocation::from_partial)
                .unwrap_or_default(),
            edits: value
                .get("edits")
                .map(Edits::from_partial)
                .unwrap_or_default(),
            languages: value
                .get("languages")
                .map(LanguageCollection::from_partial)
                .unwrap_or_default(),
            typing: value
                .get("typing")
                .map(TypingStats::from_partial)
                .unwrap_or_default(),
            projects,
        }
    }

    /// Merges `other` into this window. Our own `resets` schedule is kept.
    pub fn combine(&mut self, other: &TimeRange) {
        self.code_time.combine(&other.code_time);
        self.edits.combine(&other.edits);
        self.languages.combine(&other.languages);
        self.typing.combine(&other.typing);

        for project in &other.projects {
            match self.projects.iter_mut().find(|p| p.path == project.path) {
                Some(existing) => existing.combine(project, false),
                None => self.projects.push(project.clone()),
            }
        }
    }

    pub fn reset(&mut self, next_reset: i64) {
        *self = Self::new(next_reset);
    }

    /// Adds a default metadata entry for every project of this window that
    /// has none yet.
    pub fn ensure_project_info(&self, info: &mut BTreeMap<String, ProjectStatsInfo>) {
        for project in &self.projects {
            if !info.contains_key(&project.path) {
                info.insert(project.path.clone(), ProjectStatsInfo::new(project.path.as_str()));
            }
        }
    }

    /// Get-or-create. The returned project is moved to the front of the list.
    pub fn current_project(&mut self, path: &str) -> &mut ProjectStats {
        match self.projects.iter().position(|p| p.path == path) {
            Some(0) => {}
            Some(index) => {
                let project = self.projects.remove(index);
                self.projects.insert(0, project);
            }
            None => self.projects.insert(0, ProjectStats::new(path)),
        }
        &mut self.projects[0]
    }

    pub fn project(&self, path: &str) -> Option<&ProjectStats> {
        self.projects.iter().find(|p| p.path == path)
    }

    /// Folds the project at `source` into the one at `kept`. A missing kept
    /// project means the source is relabeled instead. Returns false when the
    /// window has no project at `source`.
    pub fn merge_project(&mut self, kept: &str, source: &str) -> bool {
        let Some(source_index) = self.projects.iter().position(|p| p.path == source) else {
            return false;
        };
        match self.projects.iter().position(|p| p.path == kept) {
            Some(kept_index) => {
                let removed = self.projects.remove(source_index);
                let kept_index = if source_index < kept_index {
                    kept_index - 1
                } else {
                    kept_index
                };
                self.projects[kept_index].combine(&removed, false);
            }
            None => self.projects[source_index].path = kept.to_string(),
        }
        true
    }

    /// Clears the language breakdown of the window and of every project in it.
    pub fn clear_languages(&mut self) {
        self.languages.clear();
        for project in &mut self.projects {
            project.languages.clear();
        }
    }
}

/// A user-created window with a fixed start.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTimeRange {
    pub start_time: i64,
    #[serde(flatten)]
    pub range: TimeRange,
}

impl CustomTimeRange {
    pub fn new(start_time: i64, resets: i64) -> Self {
        Self {
            start_time,
            range: TimeRange::new(resets),
        }
    }

    pub fn from_partial(value: &Value, now: i64) -> Self {
        let start_time = partial::count(value.get("startTime"))
            .filter(|start| *start > 0)
            .unwrap_or(now);
        Self {
            start_time,
            range: TimeRange::from_partial(value, now + RangeName::TodayTime.default_period()),
        }
    }
}

/// The three standing windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RangeName {
    AllTime,
    WeeklyTime,
    TodayTime,
}

impl RangeName {
    /// Iteration order used whenever every standing window is visited.
    pub const ALL: [RangeName; 3] = [RangeName::TodayTime, RangeName::WeeklyTime, RangeName::AllTime];

    pub fn as_str(self) -> &'static str {
        match self {
            RangeName::AllTime => "allTime",
            RangeName::WeeklyTime => "weeklyTime",
            RangeName::TodayTime => "todayTime",
        }
    }

    /// Milliseconds between resets when nothing else is configured.
    pub fn default_period(self) -> i64 {
        match self {
            RangeName::WeeklyTime => 604_800_000,
            RangeName::AllTime | RangeName::TodayTime => 86_400_000,
        }
    }
}

impl fmt::Display for RangeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangeName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allTime" | "all" => Ok(RangeName::AllTime),
            "weeklyTime" | "weekly" | "week" => Ok(RangeName::WeeklyTime),
            "todayTime" | "today" => Ok(RangeName::TodayTime),
            other => Err(format!(
                "unknown time range `{other}` (expected allTime, weeklyTime or todayTime)"
            )),
        }
    }
}
