use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::{display_name, QueryError};
use crate::stats::{CodingLanguage, Edits, NetAddRemove, RangeName, TimeAllocation};
use crate::usage::UsageTime;

/// Slices shown at most; beyond that the tail is folded into "Other".
pub const MAX_SLICES: usize = 10;
const OTHER_SLICE: &str = "Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphType {
    Lines,
    Characters,
    CharactersWb,
    Time,
}

impl GraphType {
    pub fn as_str(self) -> &'static str {
        match self {
            GraphType::Lines => "lines",
            GraphType::Characters => "characters",
            GraphType::CharactersWb => "charactersWB",
            GraphType::Time => "time",
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lines" => Ok(GraphType::Lines),
            "characters" => Ok(GraphType::Characters),
            "charactersWB" | "characters-wb" => Ok(GraphType::CharactersWb),
            "time" => Ok(GraphType::Time),
            other => Err(format!(
                "unknown graph type `{other}` (expected lines, characters, charactersWB or time)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphSubType {
    Net,
    Added,
    Removed,
    Active,
    Total,
}

impl GraphSubType {
    pub fn as_str(self) -> &'static str {
        match self {
            GraphSubType::Net => "net",
            GraphSubType::Added => "added",
            GraphSubType::Removed => "removed",
            GraphSubType::Active => "active",
            GraphSubType::Total => "total",
        }
    }
}

impl fmt::Display for GraphSubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphSubType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "net" => Ok(GraphSubType::Net),
            "added" => Ok(GraphSubType::Added),
            "removed" => Ok(GraphSubType::Removed),
            "active" => Ok(GraphSubType::Active),
            "total" => Ok(GraphSubType::Total),
            other => Err(format!(
                "unknown graph subtype `{other}` (expected net, added, removed, active or total)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSlice {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphData {
    pub data: Vec<GraphSlice>,
    pub total_amount: f64,
}

#[derive(Clone, Copy)]
struct Metric {
    kind: GraphType,
    sub: GraphSubType,
}

impl Metric {
    /// Time takes active/total; the edit counters take added/removed/net.
    fn new(kind: GraphType, sub: GraphSubType) -> Result<Self, QueryError> {
        let valid = match kind {
            GraphType::Time => matches!(sub, GraphSubType::Active | GraphSubType::Total),
            _ => matches!(
                sub,
                GraphSubType::Net | GraphSubType::Added | GraphSubType::Removed
            ),
        };
        if valid {
            Ok(Self { kind, sub })
        } else {
            Err(QueryError::InvalidGraphMetric { kind, sub })
        }
    }

    fn measure(self, time: &TimeAllocation, edits: &Edits) -> f64 {
        let counter = |counter: &NetAddRemove| match self.sub {
            GraphSubType::Added => counter.added as f64,
            GraphSubType::Removed => counter.removed as f64,
            _ => counter.net as f64,
        };
        match self.kind {
            GraphType::Time => match self.sub {
                GraphSubType::Active => time.active_time,
                _ => time.total_time,
            },
            GraphType::Lines => counter(&edits.lines),
            GraphType::Characters => counter(&edits.characters),
            GraphType::CharactersWb => counter(&edits.characters_wb),
        }
    }
}

/// Ranks the projects of a window (`rank = "project"`), its languages
/// (`"language"`) or the languages of one project (`rank` = its path) by the
/// chosen metric.
pub fn graph_data(
    usage: &UsageTime,
    range: RangeName,
    rank: &str,
    kind: GraphType,
    sub: GraphSubType,
) -> Result<GraphData, QueryError> {
    let metric = Metric::new(kind, sub)?;
    let window = usage.range(range);

    let slices: Vec<GraphSlice> = match rank {
        "project" => window
            .projects
            .iter()
            .map(|project| GraphSlice {
                name: display_name(usage, &project.path),
                amount: metric.measure(&project.time, &project.edits),
            })
            .collect(),
        "language" => language_slices(window.languages.iter(), metric),
        path => {
            let project = window
                .project(path)
                .filter(|_| !path.is_empty())
                .ok_or_else(|| QueryError::UnknownRank(path.to_string()))?;
            language_slices(project.languages.iter(), metric)
        }
    };
    Ok(fold_slices(slices))
}

fn language_slices<'a>(
    languages: impl Iterator<Item = (&'a String, &'a CodingLanguage)>,
    metric: Metric,
) -> Vec<GraphSlice> {
    languages
        .map(|(name, language)| GraphSlice {
            name: name.clone(),
            amount: metric.measure(&language.time, &language.edits),
        })
        .collect()
}

fn fold_slices(mut slices: Vec<GraphSlice>) -> GraphData {
    slices.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    let total_amount = slices.iter().map(|slice| slice.amount).sum();
    if slices.len() > MAX_SLICES {
        let rest = slices.split_off(MAX_SLICES - 1);
        slices.push(GraphSlice {
            name: OTHER_SLICE.to_string(),
            amount: rest.iter().map(|slice| slice.amount).sum(),
        });
    }
    GraphData {
        data: slices,
        total_amount,
    }
}
