//! Level thresholds and XP-to-level mapping
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_MAX_LEVEL: u32 = 100;

/// Mapping from level number to the cumulative XP required to reach it.
///
/// The table is user-editable configuration: level numbers may be
/// non-contiguous and the level-1 entry may be missing. Lookups degrade
/// instead of failing so a hand-edited table can never take the service down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelTable {
    thresholds: BTreeMap<u32, u64>,
}

/// Snapshot of a player's position in the level curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStatus {
    pub level: u32,
    pub total_xp: u64,
    /// XP still missing to reach the next defined level. `None` at the cap.
    pub xp_to_next: Option<u64>,
}

impl LevelTable {
    #[must_use]
    pub const fn new(thresholds: BTreeMap<u32, u64>) -> Self {
        Self { thresholds }
    }

    /// Number of defined levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Level reached with `xp` total XP: the largest defined level whose
    /// requirement is within `xp`. Below every threshold the smallest
    /// defined level applies; an empty table pins everyone to level 1.
    #[must_use]
    pub fn level_for_xp(&self, xp: u64) -> u32 {
        let Some(floor) = self.thresholds.keys().next().copied() else {
            return 1;
        };
        self.thresholds
            .iter()
            .take_while(|(_, required)| **required <= xp)
            .map(|(level, _)| *level)
            .last()
            .unwrap_or(floor)
    }

    /// Smallest defined level above `level`, with its XP requirement.
    #[must_use]
    pub fn next_threshold(&self, level: u32) -> Option<(u32, u64)> {
        self.thresholds
            .range(level.saturating_add(1)..)
            .next()
            .map(|(lvl, xp)| (*lvl, *xp))
    }

    /// Parse a threshold table document. A malformed table degrades to the
    /// single-level fallback so the service still starts; everyone just
    /// stays level 1 until the config is fixed.
    #[must_use]
    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(table) => table,
            Err(err) => {
                log::error!("malformed level table, degrading to level 1 only: {err}");
                Self::new(BTreeMap::from([(1, 0)]))
            }
        }
    }

    /// Full level snapshot for a given XP total.
    #[must_use]
    pub fn status_for_xp(&self, xp: u64) -> LevelStatus {
        let level = self.level_for_xp(xp);
        let xp_to_next = self
            .next_threshold(level)
            .map(|(_, required)| required.saturating_sub(xp));
        LevelStatus {
            level,
            total_xp: xp,
            xp_to_next,
        }
    }
}

impl Default for LevelTable {
    /// Levels 1..=100. Level 1 costs nothing; after that the per-level
    /// delta grows by 100 each step, i.e. `xp(n) = 50 * (n-1) * n`.
    fn default() -> Self {
        let mut thresholds = BTreeMap::new();
        for level in 1..=DEFAULT_MAX_LEVEL {
            let required = 50 * u64::from(level - 1) * u64::from(level);
            thresholds.insert(level, required);
        }
        Self { thresholds }
    }
}
