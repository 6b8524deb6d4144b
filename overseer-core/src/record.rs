//! Per-player progression record
use crate::tasks::DailyAssignment;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Everything the server remembers about one player identity.
///
/// Optional fields carry `#[serde(default)]` so records written by older
/// builds keep loading after the schema grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Opaque stable identity supplied by the host. Immutable.
    pub user_id: String,
    #[serde(default)]
    pub total_xp: u64,
    /// When the periodic time-played XP was last granted.
    pub last_xp_grant: DateTime<Utc>,
    /// Display name captured the first time the player was seen.
    #[serde(default)]
    pub original_nickname: String,
    /// Ids of the tasks assigned for the current daily cycle, in the order
    /// they were rolled.
    #[serde(default)]
    pub daily_task_ids: Vec<String>,
    /// Progress counter per assigned task id.
    #[serde(default)]
    pub daily_task_progress: HashMap<String, u32>,
    /// Tasks finished in the current cycle. Terminal until regeneration.
    #[serde(default)]
    pub completed_task_ids: HashSet<String>,
    /// Calendar day the current task set was rolled on.
    #[serde(default)]
    pub last_tasks_generated: Option<NaiveDate>,
}

impl PlayerRecord {
    /// Fresh zero-state record for a never-before-seen identity.
    #[must_use]
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            total_xp: 0,
            last_xp_grant: now,
            original_nickname: String::new(),
            daily_task_ids: Vec::new(),
            daily_task_progress: HashMap::new(),
            completed_task_ids: HashSet::new(),
            last_tasks_generated: None,
        }
    }

    /// Whether the daily task set must be rolled again: a new calendar day
    /// has begun, or the stored set is shorter than the configured count.
    #[must_use]
    pub fn needs_daily_regen(&self, today: NaiveDate, count: usize) -> bool {
        match self.last_tasks_generated {
            Some(date) => date < today || self.daily_task_ids.len() < count,
            None => true,
        }
    }

    /// Replace the daily task state with a fresh assignment.
    ///
    /// The task list, progress map, and completed set change together in
    /// one step; there is no observable partially-regenerated state.
    pub fn install_assignment(&mut self, assignment: DailyAssignment, today: NaiveDate) {
        self.daily_task_ids = assignment.task_ids;
        self.daily_task_progress = assignment.progress;
        self.completed_task_ids = HashSet::new();
        self.last_tasks_generated = Some(today);
    }

    /// Capture the player's display name on first observation. Later calls
    /// are no-ops: the original name is immutable once set.
    pub fn note_original_nickname(&mut self, nickname: &str) -> bool {
        if self.original_nickname.is_empty() && !nickname.is_empty() {
            self.original_nickname = nickname.to_string();
            return true;
        }
        false
    }

    /// Display name to render: the captured original, or `fallback` when
    /// the record predates nickname capture.
    #[must_use]
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.original_nickname.is_empty() {
            fallback
        } else {
            &self.original_nickname
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn fresh_record_needs_regen() {
        let record = PlayerRecord::new("steam64@1", now());
        assert_eq!(record.total_xp, 0);
        assert!(record.needs_daily_regen(day(2024, 3, 1), 3));
    }

    #[test]
    fn regen_due_on_new_day_or_short_set() {
        let mut record = PlayerRecord::new("u", now());
        record.install_assignment(
            DailyAssignment {
                task_ids: vec!["a".into(), "b".into(), "c".into()],
                progress: [("a".into(), 0), ("b".into(), 0), ("c".into(), 0)].into(),
            },
            day(2024, 3, 1),
        );

        assert!(!record.needs_daily_regen(day(2024, 3, 1), 3));
        assert!(record.needs_daily_regen(day(2024, 3, 2), 3));
        // Catalog grew: three assigned but four wanted.
        assert!(record.needs_daily_regen(day(2024, 3, 1), 4));
    }

    #[test]
    fn install_assignment_clears_all_cycle_state() {
        let mut record = PlayerRecord::new("u", now());
        record.daily_task_ids = vec!["old".into()];
        record.daily_task_progress.insert("old".into(), 4);
        record.completed_task_ids.insert("old".into());

        record.install_assignment(
            DailyAssignment {
                task_ids: vec!["new".into()],
                progress: [("new".into(), 0)].into(),
            },
            day(2024, 3, 2),
        );

        assert_eq!(record.daily_task_ids, vec!["new".to_string()]);
        assert_eq!(record.daily_task_progress.get("new"), Some(&0));
        assert!(!record.daily_task_progress.contains_key("old"));
        assert!(record.completed_task_ids.is_empty());
        assert_eq!(record.last_tasks_generated, Some(day(2024, 3, 2)));
    }

    #[test]
    fn original_nickname_is_write_once() {
        let mut record = PlayerRecord::new("u", now());
        assert_eq!(record.display_name("Current"), "Current");
        assert!(record.note_original_nickname("First"));
        assert!(!record.note_original_nickname("Second"));
        assert_eq!(record.original_nickname, "First");
        assert_eq!(record.display_name("Current"), "First");
    }

    #[test]
    fn serde_round_trip_preserves_every_field() {
        let mut record = PlayerRecord::new("steam64@7", now());
        record.total_xp = 1234;
        record.note_original_nickname("Nick");
        record.install_assignment(
            DailyAssignment {
                task_ids: vec!["a".into(), "b".into()],
                progress: [("a".into(), 2), ("b".into(), 0)].into(),
            },
            day(2024, 3, 1),
        );
        record.completed_task_ids.insert("a".into());

        let json = serde_json::to_string(&record).unwrap();
        let back: PlayerRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
