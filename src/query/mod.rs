//! Read and write operations behind the user-facing views.

mod graph;

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::scan::{self, GroupFileStats, ScanError, ScanOptions};
use crate::stats::{
    folder_from_path, CodingLanguage, ProjectStats, ProjectStatsInfo, RangeName, TimeAllocation,
    TimeRange, TypingSpeed,
};
use crate::usage::{ProjectError, UsageTime};

pub use graph::{graph_data, GraphData, GraphSlice, GraphSubType, GraphType, MAX_SLICES};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid project path: {0}")]
    InvalidProjectPath(String),
    #[error("No project paths were given.")]
    NoProjectPaths,
    #[error("Cannot merge {0} into itself.")]
    SelfMerge(String),
    #[error("Unknown rank `{0}`; expected project, language or a project path.")]
    UnknownRank(String),
    #[error("`{kind}` cannot be measured as `{sub}`.")]
    InvalidGraphMetric { kind: GraphType, sub: GraphSubType },
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl From<ProjectError> for QueryError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::InvalidProjectPath(path) => QueryError::InvalidProjectPath(path),
            ProjectError::NoProjectPaths => QueryError::NoProjectPaths,
            ProjectError::SelfMerge(path) => QueryError::SelfMerge(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopLanguages {
    pub top: Vec<(String, CodingLanguage)>,
    pub other: Option<OtherLanguages>,
}

/// Languages folded out of the top list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtherLanguages {
    pub amount: usize,
    pub time: TimeAllocation,
}

/// All-time languages by total time. With `amount`, only that many are
/// listed and the rest folded into `other` (reported only when it has time).
pub fn top_languages(usage: &UsageTime, amount: Option<usize>) -> TopLanguages {
    let mut sorted: Vec<(String, CodingLanguage)> = usage
        .all_time
        .languages
        .iter()
        .map(|(name, language)| (name.clone(), *language))
        .collect();
    sorted.sort_by(|a, b| b.1.time.total_time.total_cmp(&a.1.time.total_time));

    let amount = amount.unwrap_or(sorted.len()).min(sorted.len());
    let rest = sorted.split_off(amount);
    let mut other_time = TimeAllocation::default();
    for (_, language) in &rest {
        other_time.combine(&language.time);
    }
    let other = (other_time.total_time > 0.0).then(|| OtherLanguages {
        amount: rest.len(),
        time: other_time,
    });
    TopLanguages { top: sorted, other }
}

#[derive(Debug, Serialize)]
pub struct Progress<'a> {
    pub progress: &'a TimeRange,
    pub cps: TypingSpeed,
}

pub fn progress(usage: &UsageTime, range: RangeName) -> Progress<'_> {
    let progress = usage.range(range);
    Progress {
        progress,
        cps: progress.typing.cps(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectResponse {
    pub path: String,
    pub project: ProjectStats,
    pub info: ProjectStatsInfo,
}

pub fn project(
    usage: &mut UsageTime,
    range: RangeName,
    path: &str,
) -> Result<ProjectResponse, QueryError> {
    let project = usage
        .range(range)
        .project(path)
        .filter(|_| !path.is_empty())
        .cloned()
        .ok_or_else(|| QueryError::InvalidProjectPath(path.to_string()))?;
    let info = usage
        .get_current_project_info(path, true)
        .cloned()
        .ok_or_else(|| QueryError::InvalidProjectPath(path.to_string()))?;
    Ok(ProjectResponse {
        path: path.to_string(),
        project,
        info,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProjectSort {
    #[default]
    Time,
    Name,
    Path,
}

impl FromStr for ProjectSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "time" => Ok(ProjectSort::Time),
            "name" => Ok(ProjectSort::Name),
            "path" => Ok(ProjectSort::Path),
            other => Err(format!("unknown sort `{other}` (expected time, name or path)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectInfo {
    pub name: String,
    pub path: String,
    pub time: f64,
}

/// Every project of a window with its display name and total time.
pub fn all_project_info(usage: &UsageTime, range: RangeName, sort: ProjectSort) -> Vec<ProjectInfo> {
    let mut projects: Vec<ProjectInfo> = usage
        .range(range)
        .projects
        .iter()
        .map(|project| ProjectInfo {
            name: display_name(usage, &project.path),
            path: project.path.clone(),
            time: project.time.total_time,
        })
        .collect();
    match sort {
        ProjectSort::Time => projects.sort_by(|a, b| b.time.total_cmp(&a.time)),
        ProjectSort::Name => {
            projects.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        }
        ProjectSort::Path => projects.sort_by(|a, b| a.path.cmp(&b.path)),
    }
    projects
}

pub(crate) fn display_name(usage: &UsageTime, path: &str) -> String {
    match usage.project_info.get(path) {
        Some(info) => info.name.clone(),
        None => folder_from_path(path).to_string(),
    }
}

pub fn merge_projects(usage: &mut UsageTime, paths: &[String]) -> Result<(), QueryError> {
    let (kept, sources) = paths.split_first().ok_or(QueryError::NoProjectPaths)?;
    usage.merge_projects(kept, sources)?;
    Ok(())
}

pub fn scan_lines(
    path: &str,
    allowed: &[String],
    ignored: &[String],
    options: &ScanOptions,
) -> Result<GroupFileStats, QueryError> {
    if path.trim().is_empty() {
        return Err(ScanError::InvalidPath.into());
    }
    Ok(scan::scan(Path::new(path), allowed, ignored, options)?)
}

pub fn export_json(usage: &UsageTime) -> Result<String> {
    serde_json::to_string_pretty(usage).context("failed to serialize usage snapshot")
}

/// Merges an exported snapshot into `usage`.
pub fn import_json(usage: &mut UsageTime, text: &str) -> Result<(), QueryError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| QueryError::InvalidSnapshot(err.to_string()))?;
    if !value.is_object() {
        return Err(QueryError::InvalidSnapshot(
            "expected a JSON object".to_string(),
        ));
    }
    let incoming = UsageTime::from_value(&value);
    usage.combine(&incoming);
    tracing::info!(
        projects = incoming.project_info.len(),
        custom_ranges = incoming.custom_time.len(),
        "snapshot imported"
    );
    Ok(())
}
