//! Two-tier progression record store
use crate::record::PlayerRecord;
use crate::storage::{RecordStorage, Tier};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Single source of truth for progression records.
///
/// Records live in one of two tiers: `hot` holds the players currently on
/// the server and is mutated in place during gameplay; `cold` is the durable
/// superset of everyone ever seen. A record is materialized into hot on
/// first access (cloned from cold, or created fresh) and written back to
/// cold when the player departs. Hot is authoritative over cold for any id
/// it holds; the write-back is last-writer-wins.
#[derive(Debug)]
pub struct ProgressionStore<S: RecordStorage> {
    storage: S,
    hot: HashMap<String, PlayerRecord>,
    cold: HashMap<String, PlayerRecord>,
}

impl<S: RecordStorage> ProgressionStore<S> {
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            hot: HashMap::new(),
            cold: HashMap::new(),
        }
    }

    /// Load both tiers from storage. A tier that fails to decode is logged
    /// and reset to empty in memory; the next persist overwrites the corrupt
    /// durable copy. Refusing to start over one bad record would take the
    /// whole service down, so progression data is treated as expendable.
    pub fn load(&mut self) {
        self.hot = self.load_tier(Tier::Hot);
        self.cold = self.load_tier(Tier::Cold);
    }

    fn load_tier(&mut self, tier: Tier) -> HashMap<String, PlayerRecord> {
        match self.storage.load_records(tier) {
            Ok(records) => {
                log::debug!("loaded {} records into {tier} tier", records.len());
                records
                    .into_iter()
                    .map(|record| (record.user_id.clone(), record))
                    .collect()
            }
            Err(err) => {
                log::error!("resetting {tier} tier after load failure: {err}");
                HashMap::new()
            }
        }
    }

    /// Fetch the live record for `user_id`, materializing it if needed.
    ///
    /// A hot hit returns the same instance every time, so mutations through
    /// one handle are visible through the next. A cold hit is cloned into
    /// hot; without the clone a later hot mutation would alias the cold
    /// entry and `release` could no longer tell "changed" from "unchanged".
    /// An unknown id gets a fresh zero record. Absence is resolved by
    /// creation; this never fails.
    pub fn get(&mut self, user_id: &str, now: DateTime<Utc>) -> &mut PlayerRecord {
        if !self.hot.contains_key(user_id) {
            let record = self
                .cold
                .get(user_id)
                .cloned()
                .unwrap_or_else(|| PlayerRecord::new(user_id, now));
            self.hot.insert(user_id.to_string(), record);
            self.persist(Tier::Hot);
        }
        self.hot
            .entry(user_id.to_string())
            .or_insert_with(|| PlayerRecord::new(user_id, now))
    }

    /// Write the hot record back to cold and evict it. Called when the
    /// player departs. Absent ids are a no-op, not an error.
    pub fn release(&mut self, user_id: &str) {
        let Some(record) = self.hot.remove(user_id) else {
            return;
        };
        self.cold.insert(user_id.to_string(), record);
        self.persist(Tier::Cold);
        self.persist(Tier::Hot);
    }

    /// Zero the progress counters for `task_ids` on every hot record that
    /// has not completed them. Completed tasks, the completed set, and the
    /// assigned task lists are untouched; ids with no progress entry stay
    /// absent. One batched hot persist afterwards.
    pub fn reset_round_scoped(&mut self, task_ids: &HashSet<String>) {
        for record in self.hot.values_mut() {
            for task_id in task_ids {
                if record.completed_task_ids.contains(task_id) {
                    continue;
                }
                if let Some(progress) = record.daily_task_progress.get_mut(task_id) {
                    *progress = 0;
                }
            }
        }
        self.persist(Tier::Hot);
    }

    /// Best-effort write of a tier. Failures are logged and swallowed; the
    /// next mutation persists again, and gameplay is never blocked on disk.
    pub fn persist(&mut self, tier: Tier) {
        let records: Vec<PlayerRecord> = match tier {
            Tier::Hot => self.hot.values().cloned().collect(),
            Tier::Cold => self.cold.values().cloned().collect(),
        };
        if let Err(err) = self.storage.save_records(tier, &records) {
            log::warn!("failed to persist {tier} tier: {err}");
        }
    }

    /// Persist both tiers, e.g. at shutdown.
    pub fn persist_all(&mut self) {
        self.persist(Tier::Hot);
        self.persist(Tier::Cold);
    }

    #[must_use]
    pub fn is_hot(&self, user_id: &str) -> bool {
        self.hot.contains_key(user_id)
    }

    /// Read-only view of a hot record, without materializing anything.
    #[must_use]
    pub fn peek_hot(&self, user_id: &str) -> Option<&PlayerRecord> {
        self.hot.get(user_id)
    }

    /// Read-only view of a cold record.
    #[must_use]
    pub fn peek_cold(&self, user_id: &str) -> Option<&PlayerRecord> {
        self.cold.get(user_id)
    }

    pub fn hot_ids(&self) -> impl Iterator<Item = &str> {
        self.hot.keys().map(String::as_str)
    }

    #[must_use]
    pub fn hot_len(&self) -> usize {
        self.hot.len()
    }

    #[must_use]
    pub fn cold_len(&self) -> usize {
        self.cold.len()
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume the store, returning the storage backend.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }
}
