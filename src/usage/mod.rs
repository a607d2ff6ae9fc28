//! The coordinator that owns every time window and fans updates out to them.

mod projects;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::stats::partial;
use crate::stats::{
    CustomTimeRange, Edits, ProjectStats, ProjectStatsInfo, RangeName, TimeRange,
};
use crate::store::SnapshotStore;
use crate::util;

pub use projects::ProjectError;

/// Key under which the snapshot is kept in a [`SnapshotStore`].
pub const STORAGE_KEY: &str = "progressStorage";

pub type ProjectInfoMap = BTreeMap<String, ProjectStatsInfo>;

/// When the daily and weekly windows roll over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollOverPolicy {
    pub today_period_ms: i64,
    pub weekly_period_ms: i64,
    /// A window is only reset once its `resets` is this far in the past.
    pub grace_ms: i64,
}

impl Default for RollOverPolicy {
    fn default() -> Self {
        Self {
            today_period_ms: RangeName::TodayTime.default_period(),
            weekly_period_ms: RangeName::WeeklyTime.default_period(),
            grace_ms: 60_000,
        }
    }
}

struct Persistence {
    store: Box<dyn SnapshotStore>,
    interval: Duration,
}

pub struct UsageTime {
    pub start_time: i64,
    pub all_time: TimeRange,
    pub weekly_time: TimeRange,
    pub today_time: TimeRange,
    pub custom_time: Vec<CustomTimeRange>,
    /// Display names and scan filters, keyed by project path.
    pub project_info: ProjectInfoMap,
    last_save: i64,
    persistence: Option<Persistence>,
}

impl fmt::Debug for UsageTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsageTime")
            .field("start_time", &self.start_time)
            .field("all_time", &self.all_time)
            .field("weekly_time", &self.weekly_time)
            .field("today_time", &self.today_time)
            .field("custom_time", &self.custom_time)
            .field("project_info", &self.project_info)
            .field("last_save", &self.last_save)
            .field("persistent", &self.persistence.is_some())
            .finish()
    }
}

impl Default for UsageTime {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageTime {
    pub fn new() -> Self {
        Self::new_at(util::now_millis())
    }

    pub fn new_at(now: i64) -> Self {
        Self::from_value_at(&Value::Null, now)
    }

    pub fn from_value(value: &Value) -> Self {
        Self::from_value_at(value, util::now_millis())
    }

    /// Builds the coordinator from a possibly partial snapshot. Anything
    /// missing or malformed falls back to a fresh value based on `now`.
    pub fn from_value_at(value: &Value, now: i64) -> Self {
        let window = |key: &str, name: RangeName| {
            TimeRange::from_partial(
                value.get(key).unwrap_or(&Value::Null),
                now + name.default_period(),
            )
        };

        let mut project_info = ProjectInfoMap::new();
        if let Some(Value::Array(items)) = value.get("projectInfo") {
            for item in items {
                let info = ProjectStatsInfo::from_partial(item);
                project_info.insert(info.path.clone(), info);
            }
        }
        let custom_time = match value.get("customTime") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| CustomTimeRange::from_partial(item, now))
                .collect(),
            _ => Vec::new(),
        };

        let mut usage = Self {
            start_time: partial::count(value.get("startTime"))
                .filter(|start| *start > 0)
                .unwrap_or(now),
            all_time: window("allTime", RangeName::AllTime),
            weekly_time: window("weeklyTime", RangeName::WeeklyTime),
            today_time: window("todayTime", RangeName::TodayTime),
            custom_time,
            project_info,
            last_save: now,
            persistence: None,
        };
        usage.ensure_project_info();
        usage
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    /// Reads the snapshot kept in `store` (or starts fresh) and keeps the
    /// store attached for later saves.
    pub fn load(store: Box<dyn SnapshotStore>, interval: Duration) -> Result<Self> {
        let mut usage = match store.load(STORAGE_KEY)? {
            Some(text) => {
                let usage = Self::from_json(&text).context("failed to parse stored snapshot")?;
                tracing::debug!(
                    projects = usage.project_info.len(),
                    "loaded usage snapshot"
                );
                usage
            }
            None => {
                tracing::info!("no usage snapshot stored yet, starting fresh");
                Self::new()
            }
        };
        usage.attach_store(store, interval);
        Ok(usage)
    }

    pub fn attach_store(&mut self, store: Box<dyn SnapshotStore>, interval: Duration) {
        self.persistence = Some(Persistence { store, interval });
    }

    /// Merges another snapshot into this one. The earliest start wins, the
    /// standing windows are combined, custom windows appended and unknown
    /// project metadata copied over.
    pub fn combine(&mut self, other: &UsageTime) {
        self.start_time = self.start_time.min(other.start_time);
        self.all_time.combine(&other.all_time);
        self.weekly_time.combine(&other.weekly_time);
        self.today_time.combine(&other.today_time);
        self.custom_time.extend(other.custom_time.iter().cloned());

        for (path, info) in &other.project_info {
            if !self.project_info.contains_key(path) {
                self.project_info.insert(path.clone(), info.clone());
            }
        }
        self.ensure_project_info();
    }

    /// Adds a default metadata entry for every project of every window.
    pub fn ensure_project_info(&mut self) {
        let info = &mut self.project_info;
        for range in [&self.all_time, &self.weekly_time, &self.today_time] {
            range.ensure_project_info(info);
        }
        for custom in &self.custom_time {
            custom.range.ensure_project_info(info);
        }
    }

    pub fn delete_all_language_data(&mut self) {
        for range in self.ranges_mut() {
            range.clear_languages();
        }
    }

    pub fn update_code_time(
        &mut self,
        delta_time: f64,
        language: &str,
        is_active: bool,
        project_path: Option<&str>,
    ) {
        let project_path = project_path.filter(|path| !path.is_empty());
        for range in self.ranges_mut() {
            range.code_time.add(delta_time, is_active);
            range.languages.get_or_create(language).time.add(delta_time, is_active);

            if let Some(project) = Self::get_current_project(range, project_path) {
                project.time.add(delta_time, is_active);
                project
                    .languages
                    .get_or_create(language)
                    .time
                    .add(delta_time, is_active);
            }
        }
        if let Some(path) = project_path {
            self.get_current_project_info(path, true);
        }
    }

    pub fn update_edits(&mut self, edits: &Edits, language: &str, project_path: Option<&str>) {
        let project_path = project_path.filter(|path| !path.is_empty());
        for range in self.ranges_mut() {
            range.edits.combine(edits);
            range.languages.get_or_create(language).edits.combine(edits);

            if let Some(project) = Self::get_current_project(range, project_path) {
                project.edits.combine(edits);
                project.languages.get_or_create(language).edits.combine(edits);
            }
        }
        if let Some(path) = project_path {
            self.get_current_project_info(path, true);
        }
    }

    /// Feeds one inter-keystroke delay (ms) to every window.
    pub fn add_to_wpm(&mut self, delta: f64) {
        for range in self.ranges_mut() {
            range.typing.typed_character(delta);
        }
    }

    /// Get-or-create of the project at `path`, moved to the front of the
    /// window's list. `None` for a missing or empty path.
    pub fn get_current_project<'a>(
        range: &'a mut TimeRange,
        path: Option<&str>,
    ) -> Option<&'a mut ProjectStats> {
        match path {
            Some(path) if !path.is_empty() => Some(range.current_project(path)),
            _ => None,
        }
    }

    pub fn get_project<'a>(range: &'a TimeRange, path: &str) -> Option<&'a ProjectStats> {
        range.project(path)
    }

    pub fn get_current_project_info(
        &mut self,
        path: &str,
        allow_creation: bool,
    ) -> Option<&mut ProjectStatsInfo> {
        if path.is_empty() {
            return None;
        }
        if allow_creation {
            Some(
                self.project_info
                    .entry(path.to_string())
                    .or_insert_with(|| ProjectStatsInfo::new(path)),
            )
        } else {
            self.project_info.get_mut(path)
        }
    }

    pub fn range(&self, name: RangeName) -> &TimeRange {
        match name {
            RangeName::AllTime => &self.all_time,
            RangeName::WeeklyTime => &self.weekly_time,
            RangeName::TodayTime => &self.today_time,
        }
    }

    pub fn range_mut(&mut self, name: RangeName) -> &mut TimeRange {
        match name {
            RangeName::AllTime => &mut self.all_time,
            RangeName::WeeklyTime => &mut self.weekly_time,
            RangeName::TodayTime => &mut self.today_time,
        }
    }

    /// Visits today, weekly and all-time in that order. Custom windows are
    /// not included.
    pub fn for_all_time_ranges(&self, mut callback: impl FnMut(&TimeRange, RangeName)) {
        for name in RangeName::ALL {
            callback(self.range(name), name);
        }
    }

    /// Every window that receives live updates, custom ones included.
    pub fn ranges_mut(&mut self) -> impl Iterator<Item = &mut TimeRange> + '_ {
        [&mut self.all_time, &mut self.weekly_time, &mut self.today_time]
            .into_iter()
            .chain(self.custom_time.iter_mut().map(|custom| &mut custom.range))
    }

    pub fn add_custom_range(&mut self, start_time: i64, resets: i64) -> &CustomTimeRange {
        self.custom_time.push(CustomTimeRange::new(start_time, resets));
        let index = self.custom_time.len() - 1;
        &self.custom_time[index]
    }

    /// Resets the daily and weekly windows whose boundary has passed.
    pub fn roll_over(&mut self, now: i64, policy: &RollOverPolicy) -> Vec<RangeName> {
        let mut rolled = Vec::new();
        for (name, period) in [
            (RangeName::TodayTime, policy.today_period_ms),
            (RangeName::WeeklyTime, policy.weekly_period_ms),
        ] {
            let range = self.range_mut(name);
            if range.resets < now - policy.grace_ms {
                range.reset(now + period);
                tracing::info!(range = %name, next_reset = now + period, "time range rolled over");
                rolled.push(name);
            }
        }
        rolled
    }

    /// Drops every statistic. An attached store stays attached.
    pub fn reset_all(&mut self, now: i64) {
        let persistence = self.persistence.take();
        *self = Self::new_at(now);
        self.persistence = persistence;
        tracing::info!("all usage statistics reset");
    }

    pub fn last_save(&self) -> i64 {
        self.last_save
    }

    pub fn save(&mut self, force: bool) -> Result<bool> {
        self.save_at(force, util::now_millis())
    }

    /// Writes the snapshot to the attached store. Unless forced, the write is
    /// skipped when the interval is zero or has not elapsed since the last
    /// save. Returns whether anything was written.
    pub fn save_at(&mut self, force: bool, now: i64) -> Result<bool> {
        let Some(persistence) = &self.persistence else {
            return Ok(false);
        };
        let interval = i64::try_from(persistence.interval.as_millis()).unwrap_or(i64::MAX);
        if !force && (interval == 0 || now < self.last_save.saturating_add(interval)) {
            tracing::debug!(since_last = now - self.last_save, "save throttled");
            return Ok(false);
        }

        let text = serde_json::to_string(&self.to_json()).context("failed to serialize snapshot")?;
        persistence
            .store
            .store(STORAGE_KEY, &text)
            .context("failed to persist snapshot")?;
        self.last_save = now;
        tracing::info!(bytes = text.len(), force, "usage snapshot saved");
        Ok(true)
    }

    /// The persisted shape: project metadata as an array, bookkeeping left out.
    pub fn to_json(&self) -> Snapshot<'_> {
        Snapshot {
            start_time: self.start_time,
            all_time: &self.all_time,
            weekly_time: &self.weekly_time,
            today_time: &self.today_time,
            custom_time: &self.custom_time,
            project_info: self.project_info.values().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<'a> {
    pub start_time: i64,
    pub all_time: &'a TimeRange,
    pub weekly_time: &'a TimeRange,
    pub today_time: &'a TimeRange,
    pub custom_time: &'a [CustomTimeRange],
    pub project_info: Vec<&'a ProjectStatsInfo>,
}

impl Serialize for UsageTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::NetAddRemove;
    use crate::store::MemoryStore;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    fn edits(lines: i64, characters: i64) -> Edits {
        Edits {
            lines: NetAddRemove::new(lines, 0),
            characters: NetAddRemove::new(characters, 0),
            characters_wb: NetAddRemove::new(characters, 0),
        }
    }

    #[test]
    fn fresh_windows_reset_on_their_default_periods() {
        let usage = UsageTime::new_at(NOW);
        assert_eq!(usage.start_time, NOW);
        assert_eq!(usage.today_time.resets, NOW + 86_400_000);
        assert_eq!(usage.weekly_time.resets, NOW + 604_800_000);
        assert!(usage.custom_time.is_empty());
    }

    #[test]
    fn updates_fan_out_to_every_window() {
        let mut usage = UsageTime::new_at(NOW);
        usage.add_custom_range(NOW, NOW + 1000);

        usage.update_code_time(1000.0, "rust", true, Some("/work/devtally"));
        usage.update_code_time(500.0, "rust", false, None);
        usage.update_edits(&edits(3, 40), "rust", Some("/work/devtally"));

        for range in usage.ranges_mut() {
            assert_eq!(range.code_time.total_time, 1500.0);
            assert_eq!(range.code_time.active_time, 1000.0);
            assert_eq!(range.edits.lines, NetAddRemove::new(3, 0));
            let language = range.languages.get("rust").unwrap();
            assert_eq!(language.time.total_time, 1500.0);
            assert_eq!(language.edits.characters.added, 40);

            let project = range.project("/work/devtally").unwrap();
            assert_eq!(project.time.total_time, 1000.0);
            assert_eq!(project.edits.lines.added, 3);
            assert_eq!(project.languages.get("rust").unwrap().time.active_time, 1000.0);
        }
        assert_eq!(usage.project_info["/work/devtally"].name, "devtally");
    }

    #[test]
    fn empty_project_path_is_ignored() {
        let mut usage = UsageTime::new_at(NOW);
        usage.update_code_time(10.0, "go", true, Some(""));
        assert!(usage.all_time.projects.is_empty());
        assert!(usage.project_info.is_empty());
        assert!(usage.get_current_project_info("", true).is_none());
    }

    #[test]
    fn typing_reaches_every_window() {
        let mut usage = UsageTime::new_at(NOW);
        usage.add_custom_range(NOW, NOW + 1);
        usage.add_to_wpm(120.0);
        for range in usage.ranges_mut() {
            assert_eq!(range.typing.samples(), &[120.0]);
        }
    }

    #[test]
    fn current_project_stays_in_front() {
        let mut range = TimeRange::new(0);
        UsageTime::get_current_project(&mut range, Some("/one"))
            .unwrap()
            .time
            .add(5.0, true);
        UsageTime::get_current_project(&mut range, Some("/two"));
        UsageTime::get_current_project(&mut range, Some("/three"));

        let project = UsageTime::get_current_project(&mut range, Some("/one")).unwrap();
        assert_eq!(project.time.total_time, 5.0);
        assert_eq!(range.projects[0].path, "/one");
        assert!(UsageTime::get_current_project(&mut range, None).is_none());
        assert!(UsageTime::get_project(&range, "/nope").is_none());
    }

    #[test]
    fn project_info_lookup_can_refuse_creation() {
        let mut usage = UsageTime::new_at(NOW);
        assert!(usage.get_current_project_info("/p", false).is_none());
        assert!(usage.get_current_project_info("/p", true).is_some());
        assert!(usage.get_current_project_info("/p", false).is_some());
    }

    #[test]
    fn snapshot_round_trip_preserves_counters() {
        let mut usage = UsageTime::new_at(NOW);
        usage.update_code_time(2500.0, "typescript", true, Some("/a"));
        usage.update_edits(&edits(7, 90), "typescript", Some("/b"));
        for delta in 1..=120 {
            usage.add_to_wpm(f64::from(delta));
        }
        usage.get_current_project_info("/a", true).unwrap().set_name("Project A");
        usage.add_custom_range(NOW - 10, NOW + 10);

        let text = serde_json::to_string(&usage).unwrap();
        let restored = UsageTime::from_json(&text).unwrap();

        for name in RangeName::ALL {
            assert_eq!(restored.range(name), usage.range(name));
        }
        assert_eq!(restored.custom_time, usage.custom_time);
        assert_eq!(restored.project_info, usage.project_info);
        assert_eq!(restored.start_time, NOW);
        assert!(restored.all_time.typing.is_ready());
    }

    #[test]
    fn snapshot_lists_project_info_as_an_array() {
        let mut usage = UsageTime::new_at(NOW);
        usage.get_current_project_info("/x", true);
        let value = serde_json::to_value(&usage).unwrap();
        assert!(value["projectInfo"].is_array());
        assert_eq!(value["projectInfo"][0]["path"], json!("/x"));
        assert!(value.get("lastSave").is_none());
    }

    #[test]
    fn loading_fills_missing_project_info() {
        let usage = UsageTime::from_value_at(
            &json!({
                "startTime": 5,
                "allTime": { "projects": [{ "path": "/legacy/proj", "timeAllocation": { "totalTime": 9 } }] },
                "todayTime": { "projects": [{ "path": "/today/only" }] },
                "customTime": [{ "startTime": 3, "projects": [{ "path": "/custom/only" }] }]
            }),
            NOW,
        );
        assert_eq!(usage.start_time, 5);
        assert_eq!(usage.all_time.projects[0].time.total_time, 9.0);
        assert_eq!(usage.project_info["/legacy/proj"].name, "proj");
        assert!(usage.project_info.contains_key("/today/only"));
        assert!(usage.project_info.contains_key("/custom/only"));
        assert_eq!(usage.custom_time[0].start_time, 3);
    }

    #[test]
    fn oversized_edit_counts_load_and_combine() {
        let snapshot = json!({
            "allTime": { "edits": { "lines": { "added": 9.0e18, "removed": -9.0e18 } } }
        });
        let mut usage = UsageTime::from_value_at(&snapshot, NOW);
        assert_eq!(usage.all_time.edits.lines.net, i64::MAX);

        let incoming = UsageTime::from_value_at(&snapshot, NOW);
        usage.combine(&incoming);
        assert_eq!(usage.all_time.edits.lines.added, i64::MAX);
        assert_eq!(usage.all_time.edits.lines.removed, i64::MIN);
        assert_eq!(usage.all_time.edits.lines.net, i64::MAX);
    }

    #[test]
    fn malformed_snapshot_defaults() {
        let usage = UsageTime::from_value_at(&json!({ "startTime": "soon", "allTime": 4 }), NOW);
        assert_eq!(usage.start_time, NOW);
        assert_eq!(usage.all_time.code_time.total_time, 0.0);
        assert_eq!(usage.all_time.resets, NOW + 86_400_000);
    }

    #[test]
    fn combine_merges_snapshots() {
        let mut local = UsageTime::new_at(NOW);
        local.update_code_time(100.0, "rust", true, Some("/shared"));
        local.get_current_project_info("/shared", true).unwrap().set_name("Local name");
        let local_resets = local.today_time.resets;

        let mut remote = UsageTime::new_at(NOW - 5000);
        remote.update_code_time(50.0, "rust", false, Some("/shared"));
        remote.update_code_time(25.0, "c", true, Some("/remote"));
        remote.get_current_project_info("/shared", true).unwrap().set_name("Remote name");
        remote.add_custom_range(NOW - 5000, NOW);

        local.combine(&remote);

        assert_eq!(local.start_time, NOW - 5000);
        assert_eq!(local.today_time.resets, local_resets);
        assert_eq!(local.all_time.code_time.total_time, 175.0);
        assert_eq!(local.all_time.project("/shared").unwrap().time.total_time, 150.0);
        assert_eq!(local.all_time.projects.len(), 2);
        assert_eq!(local.project_info["/shared"].name, "Local name");
        assert!(local.project_info.contains_key("/remote"));
        assert_eq!(local.custom_time.len(), 1);
    }

    #[test]
    fn deleting_language_data_keeps_other_counters() {
        let mut usage = UsageTime::new_at(NOW);
        usage.add_custom_range(NOW, NOW + 1);
        usage.update_code_time(100.0, "rust", true, Some("/p"));
        usage.delete_all_language_data();
        for range in usage.ranges_mut() {
            assert!(range.languages.is_empty());
            assert!(range.projects[0].languages.is_empty());
            assert_eq!(range.code_time.total_time, 100.0);
        }
    }

    #[test]
    fn for_all_time_ranges_skips_custom_windows() {
        let mut usage = UsageTime::new_at(NOW);
        usage.add_custom_range(NOW, NOW + 1);
        let mut seen = Vec::new();
        usage.for_all_time_ranges(|_, name| seen.push(name));
        assert_eq!(
            seen,
            [RangeName::TodayTime, RangeName::WeeklyTime, RangeName::AllTime]
        );
    }

    #[test]
    fn roll_over_resets_expired_windows_only() {
        let mut usage = UsageTime::new_at(NOW);
        usage.update_code_time(100.0, "rust", true, None);
        let policy = RollOverPolicy::default();

        assert!(usage.roll_over(NOW + 86_400_000 + 30_000, &policy).is_empty());

        let later = NOW + 86_400_000 + 61_000;
        assert_eq!(usage.roll_over(later, &policy), [RangeName::TodayTime]);
        assert_eq!(usage.today_time.resets, later + 86_400_000);
        assert_eq!(usage.today_time.code_time.total_time, 0.0);
        assert_eq!(usage.weekly_time.code_time.total_time, 100.0);
        assert_eq!(usage.all_time.code_time.total_time, 100.0);
    }

    #[test]
    fn saves_are_throttled_unless_forced() {
        let store = MemoryStore::new();
        let mut usage = UsageTime::new_at(NOW);
        assert!(!usage.save_at(true, NOW).unwrap());

        usage.attach_store(Box::new(store.clone()), Duration::from_secs(15));
        assert!(!usage.save_at(false, NOW + 1000).unwrap());
        assert!(store.get(STORAGE_KEY).is_none());

        assert!(usage.save_at(false, NOW + 15_000).unwrap());
        assert_eq!(usage.last_save(), NOW + 15_000);
        assert!(!usage.save_at(false, NOW + 16_000).unwrap());
        assert!(usage.save_at(true, NOW + 16_000).unwrap());

        let stored = store.get(STORAGE_KEY).unwrap();
        let value: Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(value["startTime"], json!(NOW));
    }

    #[test]
    fn zero_interval_only_saves_when_forced() {
        let store = MemoryStore::new();
        let mut usage = UsageTime::new_at(NOW);
        usage.attach_store(Box::new(store.clone()), Duration::ZERO);
        assert!(!usage.save_at(false, NOW + 1_000_000).unwrap());
        assert!(usage.save_at(true, NOW + 1_000_000).unwrap());
    }

    #[test]
    fn reset_all_keeps_the_store() {
        let store = MemoryStore::new();
        let mut usage = UsageTime::new_at(NOW);
        usage.update_code_time(42.0, "rust", true, Some("/p"));
        usage.attach_store(Box::new(store.clone()), Duration::from_secs(1));

        usage.reset_all(NOW + 5);
        assert_eq!(usage.start_time, NOW + 5);
        assert!(usage.project_info.is_empty());
        assert_eq!(usage.all_time.code_time.total_time, 0.0);
        assert!(usage.save_at(true, NOW + 6).unwrap());
        assert!(store.get(STORAGE_KEY).is_some());
    }

    #[test]
    fn load_reads_an_attached_store() {
        let store = MemoryStore::new();
        let mut usage = UsageTime::new_at(NOW);
        usage.update_code_time(42.0, "rust", true, Some("/p"));
        usage.attach_store(Box::new(store.clone()), Duration::from_secs(1));
        usage.save(true).unwrap();

        let loaded = UsageTime::load(Box::new(store.clone()), Duration::from_secs(1)).unwrap();
        assert_eq!(loaded.all_time, usage.all_time);

        let fresh = UsageTime::load(Box::new(MemoryStore::new()), Duration::from_secs(1)).unwrap();
        assert_eq!(fresh.all_time.code_time.total_time, 0.0);
    }
}
