//! Additive counters and the per-window aggregates built from them.

pub mod counters;
pub mod language;
pub(crate) mod partial;
pub mod project;
pub mod range;
pub mod typing;

pub use counters::{Edits, NetAddRemove, TimeAllocation};
pub use language::{CodingLanguage, LanguageCollection};
pub use project::{
    folder_from_path, ProjectStats, ProjectStatsInfo, StatCounterSearch, MAX_PROJECT_NAME_LEN,
    UNKNOWN_PROJECT_PATH,
};
pub use range::{CustomTimeRange, RangeName, TimeRange};
pub use typing::{calculate_median, is_valid_delay, TypingSpeed, TypingStats};
