use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::partial;

/// Additions and removals of some countable thing (lines, characters).
///
/// `net` is always derived as `added - removed` when a value is constructed.
/// `combine` adds the other side's fields one by one, so a delta that carries
/// its own `net` is taken as given. Arithmetic saturates at the `i64` bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct NetAddRemove {
    pub added: i64,
    pub removed: i64,
    pub net: i64,
}

impl NetAddRemove {
    pub fn new(added: i64, removed: i64) -> Self {
        Self {
            added,
            removed,
            net: added.saturating_sub(removed),
        }
    }

    pub fn from_partial(value: &Value) -> Self {
        let added = partial::count(value.get("added")).unwrap_or(0);
        let removed = partial::count(value.get("removed")).unwrap_or(0);
        Self::new(added, removed)
    }

    pub fn combine(&mut self, other: &NetAddRemove) {
        self.added = self.added.saturating_add(other.added);
        self.removed = self.removed.saturating_add(other.removed);
        self.net = self.net.saturating_add(other.net);
    }

    /// Adds whichever of `added`, `removed` and `net` the record carries as
    /// numbers. Missing or non-numeric fields are left untouched.
    pub fn combine_partial(&mut self, value: &Value) {
        if let Some(added) = partial::count(value.get("added")) {
            self.added = self.added.saturating_add(added);
        }
        if let Some(removed) = partial::count(value.get("removed")) {
            self.removed = self.removed.saturating_add(removed);
        }
        if let Some(net) = partial::count(value.get("net")) {
            self.net = self.net.saturating_add(net);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl From<Value> for NetAddRemove {
    fn from(value: Value) -> Self {
        Self::from_partial(&value)
    }
}

/// Milliseconds spent with a document open (`total_time`) and with the window
/// focused (`active_time`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", rename_all = "camelCase")]
pub struct TimeAllocation {
    pub total_time: f64,
    pub active_time: f64,
}

impl TimeAllocation {
    pub fn from_partial(value: &Value) -> Self {
        Self {
            total_time: partial::number_or_zero(value.get("totalTime")),
            active_time: partial::number_or_zero(value.get("activeTime")),
        }
    }

    pub fn add(&mut self, delta: f64, is_active: bool) {
        self.total_time += delta;
        if is_active {
            self.active_time += delta;
        }
    }

    pub fn combine(&mut self, other: &TimeAllocation) {
        self.total_time += other.total_time;
        self.active_time += other.active_time;
    }
}

impl From<Value> for TimeAllocation {
    fn from(value: Value) -> Self {
        Self::from_partial(&value)
    }
}

/// Edit counters. `characters_wb` leaves out bulk changes such as pastes and
/// autofill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Edits {
    pub lines: NetAddRemove,
    pub characters: NetAddRemove,
    #[serde(rename = "charactersWB")]
    pub characters_wb: NetAddRemove,
}

impl Edits {
    pub fn from_partial(value: &Value) -> Self {
        let field = |key: &str| {
            value
                .get(key)
                .map(NetAddRemove::from_partial)
                .unwrap_or_default()
        };
        Self {
            lines: field("lines"),
            characters: field("characters"),
            characters_wb: field("charactersWB"),
        }
    }

    pub fn combine(&mut self, other: &Edits) {
        self.lines.combine(&other.lines);
        self.characters.combine(&other.characters);
        self.characters_wb.combine(&other.characters_wb);
    }

    pub fn combine_partial(&mut self, value: &Value) {
        if let Some(lines) = value.get("lines") {
            self.lines.combine_partial(lines);
        }
        if let Some(characters) = value.get("characters") {
            self.characters.combine_partial(characters);
        }
        if let Some(characters_wb) = value.get("charactersWB") {
            self.characters_wb.combine_partial(characters_wb);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.characters.clear();
        self.characters_wb.clear();
    }
}

impl From<Value> for Edits {
    fn from(value: Value) -> Self {
        Self::from_partial(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn net_is_derived_on_construction() {
        let counter = NetAddRemove::from_partial(&json!({ "added": 4, "removed": 5, "net": 100 }));
        assert_eq!(counter, NetAddRemove::new(4, 5));
        assert_eq!(counter.net, -1);
    }

    #[test]
    fn malformed_records_default_to_zero() {
        assert_eq!(NetAddRemove::from_partial(&json!({})), NetAddRemove::default());
        assert_eq!(
            NetAddRemove::from_partial(&json!({ "added": "lots", "removed": [1] })),
            NetAddRemove::default()
        );
        assert_eq!(NetAddRemove::from_partial(&json!("nope")), NetAddRemove::default());
        assert_eq!(
            TimeAllocation::from_partial(&json!({ "totalTime": "300", "activeTime": {} })),
            TimeAllocation {
                total_time: 300.0,
                active_time: 0.0
            }
        );
    }

    #[test]
    fn combine_partial_skips_absent_fields() {
        let mut counter = NetAddRemove::new(10, 2);
        counter.combine_partial(&json!({ "added": 4, "net": 4 }));
        assert_eq!(
            counter,
            NetAddRemove {
                added: 14,
                removed: 2,
                net: 12
            }
        );

        counter.combine_partial(&json!({ "added": "x", "removed": 1 }));
        assert_eq!(counter.added, 14);
        assert_eq!(counter.removed, 3);
    }

    #[test]
    fn edits_combine_partial_touches_present_counters() {
        let mut edits = Edits::default();
        edits.combine_partial(&json!({
            "lines": { "added": 3, "net": 3 },
            "charactersWB": { "removed": 2, "net": -2 }
        }));
        assert_eq!(edits.lines, NetAddRemove::new(3, 0));
        assert_eq!(edits.characters, NetAddRemove::default());
        assert_eq!(edits.characters_wb, NetAddRemove::new(0, 2));
    }

    #[test]
    fn combine_adds_every_field() {
        let mut counter = NetAddRemove::new(10, 2);
        counter.combine(&NetAddRemove::new(4, 1));
        assert_eq!(
            counter,
            NetAddRemove {
                added: 14,
                removed: 3,
                net: 11
            }
        );
    }

    #[test]
    fn huge_counts_saturate() {
        let counter = NetAddRemove::from_partial(&json!({ "added": 9e18, "removed": -9e18 }));
        assert_eq!(counter.added, 9_000_000_000_000_000_000);
        assert_eq!(counter.removed, -9_000_000_000_000_000_000);
        assert_eq!(counter.net, i64::MAX);

        let mut total = counter;
        total.combine(&counter);
        assert_eq!(total.added, i64::MAX);
        assert_eq!(total.removed, i64::MIN);
        assert_eq!(total.net, i64::MAX);

        total.combine_partial(&json!({ "added": 9e18, "removed": -9e18 }));
        assert_eq!(total.added, i64::MAX);
        assert_eq!(total.removed, i64::MIN);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut counter = NetAddRemove::new(9, 3);
        counter.clear();
        assert_eq!(counter, NetAddRemove::default());
        counter.clear();
        assert_eq!(counter, NetAddRemove::default());
    }

    #[test]
    fn edits_use_the_persisted_key_names() {
        let edits = Edits {
            lines: NetAddRemove::new(3, 1),
            characters: NetAddRemove::new(40, 2),
            characters_wb: NetAddRemove::new(20, 2),
        };
        let value = serde_json::to_value(edits).unwrap();
        assert_eq!(value["charactersWB"]["net"], json!(18));

        let back: Edits = serde_json::from_value(value).unwrap();
        assert_eq!(back, edits);
    }

    #[test]
    fn edits_combine_and_clear() {
        let mut edits = Edits::from_partial(&json!({
            "lines": { "added": 32, "removed": 4 },
            "characters": { "added": 546, "removed": 33 },
        }));
        edits.combine(&Edits::from_partial(&json!({
            "lines": { "added": 6, "removed": 6 },
            "charactersWB": { "added": 55, "removed": 1 },
        })));
        assert_eq!(edits.lines, NetAddRemove::new(38, 10));
        assert_eq!(edits.characters, NetAddRemove::new(546, 33));
        assert_eq!(edits.characters_wb, NetAddRemove::new(55, 1));

        edits.clear();
        assert_eq!(edits, Edits::default());
    }

    #[test]
    fn time_allocation_only_counts_active_time_when_focused() {
        let mut time = TimeAllocation::default();
        time.add(1000.0, true);
        time.add(500.0, false);
        assert_eq!(time.total_time, 1500.0);
        assert_eq!(time.active_time, 1000.0);
    }
}
