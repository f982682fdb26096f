//! Per-dotpoint progress stats derived from persisted progress blobs.
//!
//! Progress lives under the canonical key `learn-progress:<id>`. Older builds
//! wrote `learn-progress-<id>`; reading a dotpoint migrates its legacy entry
//! to the canonical key, and [`migrate_legacy_keys`] migrates a whole store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::store::ProgressStore;

const CANONICAL_PREFIX: &str = "learn-progress:";
const LEGACY_PREFIX: &str = "learn-progress-";

/// Title shown when a dotpoint has no title.
pub const TITLE_PLACEHOLDER: &str = "—";

/// Canonical store key for a dotpoint.
pub fn canonical_key(dotpoint_id: &str) -> String {
    format!("{CANONICAL_PREFIX}{dotpoint_id}")
}

/// Legacy store key for a dotpoint.
pub fn legacy_key(dotpoint_id: &str) -> String {
    format!("{LEGACY_PREFIX}{dotpoint_id}")
}

/// Stats derived from one dotpoint's progress record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStats {
    pub sections_completed: usize,
    pub xp_earned: u64,
}

impl ProgressStats {
    /// Derive stats from a raw progress blob.
    ///
    /// The section count is the length of the first non-empty list among
    /// `completedIds`, `completed` and `completedSections`; XP is the first
    /// non-zero of `totalXP` and `xp`, numeric strings included. Anything
    /// unparsable yields zeros.
    pub fn from_json(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("ignoring unparsable progress record: {e}");
                return Self::default();
            }
        };

        let sections_completed = ["completedIds", "completed", "completedSections"]
            .iter()
            .filter_map(|field| value.get(field).and_then(Value::as_array))
            .map(Vec::len)
            .find(|len| *len > 0)
            .unwrap_or(0);

        let xp_earned = ["totalXP", "xp"]
            .iter()
            .filter_map(|field| value.get(field).and_then(xp_value))
            .find(|xp| *xp != 0.0)
            .map(|xp| xp.max(0.0).round() as u64)
            .unwrap_or(0);

        Self {
            sections_completed,
            xp_earned,
        }
    }
}

fn xp_value(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|xp| xp.is_finite()),
        other => other.as_f64(),
    }
}

/// Load the stats for a dotpoint.
///
/// Reads the canonical key; if it is absent and the legacy key is present,
/// the legacy value is moved to the canonical key before being used. A failed
/// migration write is logged and the value read is still used.
pub fn load_stats(store: &mut dyn ProgressStore, dotpoint_id: &str) -> ProgressStats {
    let canonical = canonical_key(dotpoint_id);
    if let Some(raw) = store.get(&canonical) {
        return ProgressStats::from_json(&raw);
    }

    let legacy = legacy_key(dotpoint_id);
    let Some(raw) = store.get(&legacy) else {
        return ProgressStats::default();
    };

    match move_entry(store, &legacy, &canonical, &raw) {
        Ok(()) => tracing::info!("migrated progress key {legacy} -> {canonical}"),
        Err(e) => tracing::warn!("failed to migrate progress key {legacy}: {e}"),
    }

    ProgressStats::from_json(&raw)
}

fn move_entry(
    store: &mut dyn ProgressStore,
    from: &str,
    to: &str,
    value: &str,
) -> Result<(), StoreError> {
    store.set(to, value)?;
    store.remove(from)
}

/// Outcome of a bulk key migration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    /// Legacy entries moved to their canonical key.
    pub migrated: Vec<String>,
    /// Legacy entries dropped because a canonical entry already existed.
    pub dropped: Vec<String>,
}

/// Move every legacy `learn-progress-<id>` entry to `learn-progress:<id>`.
///
/// When both keys exist the canonical value wins and the legacy entry is
/// removed. Running it twice is a no-op.
pub fn migrate_legacy_keys(store: &mut dyn ProgressStore) -> Result<MigrationSummary, StoreError> {
    let mut summary = MigrationSummary::default();

    for key in store.keys() {
        let Some(id) = key.strip_prefix(LEGACY_PREFIX) else {
            continue;
        };
        let canonical = canonical_key(id);

        if store.get(&canonical).is_some() {
            store.remove(&key)?;
            summary.dropped.push(id.to_string());
        } else if let Some(raw) = store.get(&key) {
            move_entry(store, &key, &canonical, &raw)?;
            summary.migrated.push(id.to_string());
        }
    }

    Ok(summary)
}

/// Completion flags of the three activities of a dotpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionFlags {
    pub learn: bool,
    pub quiz: bool,
    pub practice: bool,
}

impl CompletionFlags {
    pub fn completed_count(&self) -> u8 {
        [self.learn, self.quiz, self.practice]
            .iter()
            .filter(|done| **done)
            .count() as u8
    }

    /// Completed activities out of three, as a rounded percentage.
    pub fn overall_percent(&self) -> u8 {
        (f64::from(self.completed_count()) * 100.0 / 3.0).round() as u8
    }
}

/// Everything the progress panel shows for one dotpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub dotpoint_id: String,
    pub title: Option<String>,
    pub stats: ProgressStats,
    pub flags: CompletionFlags,
    pub overall_percent: u8,
}

impl ProgressSummary {
    pub fn new(
        dotpoint_id: &str,
        title: Option<String>,
        stats: ProgressStats,
        flags: CompletionFlags,
    ) -> Self {
        Self {
            dotpoint_id: dotpoint_id.to_string(),
            title,
            stats,
            overall_percent: flags.overall_percent(),
            flags,
        }
    }

    /// Load stats from `store` and combine them with the activity flags.
    pub fn load(
        store: &mut dyn ProgressStore,
        dotpoint_id: &str,
        title: Option<String>,
        flags: CompletionFlags,
    ) -> Self {
        let stats = load_stats(store, dotpoint_id);
        Self::new(dotpoint_id, title, stats, flags)
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(TITLE_PLACEHOLDER)
    }
}
