//! XP award pipeline and task progress engine
use crate::level::LevelTable;
use crate::record::PlayerRecord;
use crate::roles::{ItemKind, Role};
use crate::tasks::{TaskCatalog, TaskObjective};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why XP was granted. Carried in the outcome so the presentation layer can
/// pick the matching hint text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpReason {
    Kill,
    TimePlayed,
    TeamWin,
    TaskCompleted,
}

impl XpReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kill => "kill",
            Self::TimePlayed => "time_played",
            Self::TeamWin => "team_win",
            Self::TaskCompleted => "task_completed",
        }
    }
}

impl fmt::Display for XpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum XpError {
    /// Negative or zero deltas are caller bugs. Clamping would mask them,
    /// so they are rejected with a diagnostic instead.
    #[error("xp delta must be positive, got {0}")]
    NonPositiveDelta(i64),
}

/// Result of one XP award, for presentation and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwardOutcome {
    pub reason: XpReason,
    pub amount: u64,
    pub new_total_xp: u64,
    pub old_level: u32,
    pub new_level: u32,
    pub leveled_up: bool,
}

/// Apply a positive XP delta to a record and report the level transition.
///
/// XP is unbounded and never decreases. The pipeline neither persists nor
/// renders; the caller triggers both afterwards, which keeps this function
/// composable and testable without I/O.
///
/// # Errors
///
/// Returns [`XpError::NonPositiveDelta`] when `delta <= 0`.
pub fn award(
    table: &LevelTable,
    record: &mut PlayerRecord,
    delta: i64,
    reason: XpReason,
) -> Result<AwardOutcome, XpError> {
    if delta <= 0 {
        log::warn!(
            "rejected xp award of {delta} ({reason}) for {}",
            record.user_id
        );
        return Err(XpError::NonPositiveDelta(delta));
    }
    let amount = delta.unsigned_abs();

    let old_level = table.level_for_xp(record.total_xp);
    record.total_xp = record.total_xp.saturating_add(amount);
    let new_level = table.level_for_xp(record.total_xp);

    Ok(AwardOutcome {
        reason,
        amount,
        new_total_xp: record.total_xp,
        old_level,
        new_level,
        leveled_up: new_level > old_level,
    })
}

/// A game fact that can advance task progress, attributed to one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    /// The player killed `victim`, holding `item` at the time.
    Kill {
        victim: Role,
        item: Option<ItemKind>,
    },
    /// The player restrained `victim`.
    Restrain { victim: Role },
    /// The player died from fall damage.
    FallDeath,
}

/// A task that just crossed its threshold. Reported exactly once per cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCompletion {
    pub task_id: String,
    pub xp_reward: u64,
}

/// Run one game fact through the player's assigned tasks.
///
/// Completed tasks are terminal for the cycle and are skipped, so a task can
/// complete at most once per assignment. Ids missing from the catalog are
/// skipped too: catalog edits must not corrupt existing records. The caller
/// pays each reported reward through [`award`].
pub fn apply_task_event(
    catalog: &TaskCatalog,
    record: &mut PlayerRecord,
    event: &TaskEvent,
) -> Vec<TaskCompletion> {
    let mut completions = Vec::new();

    let assigned = record.daily_task_ids.clone();
    for task_id in assigned {
        if record.completed_task_ids.contains(&task_id) {
            continue;
        }
        let Some(definition) = catalog.find(&task_id) else {
            continue;
        };

        let completed = match (&definition.objective, event) {
            (TaskObjective::KillCount { team, required }, TaskEvent::Kill { victim, .. })
                if victim.team() == Some(*team) =>
            {
                let progress = record.daily_task_progress.entry(task_id.clone()).or_insert(0);
                *progress += 1;
                *progress >= *required
            }
            (
                TaskObjective::KillWithItem { team, item },
                TaskEvent::Kill {
                    victim,
                    item: Some(held),
                },
            ) => victim.team() == Some(*team) && held == item,
            (TaskObjective::RestrainCount { team, required }, TaskEvent::Restrain { victim })
                if victim.team() == Some(*team) =>
            {
                let progress = record.daily_task_progress.entry(task_id.clone()).or_insert(0);
                *progress += 1;
                *progress >= *required
            }
            (TaskObjective::FallDeath, TaskEvent::FallDeath) => true,
            _ => false,
        };

        if completed {
            record.completed_task_ids.insert(task_id.clone());
            completions.push(TaskCompletion {
                task_id,
                xp_reward: definition.xp_reward,
            });
        }
    }

    completions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Team;
    use crate::tasks::{DailyAssignment, TaskDefinition};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn record() -> PlayerRecord {
        PlayerRecord::new("U1", Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
    }

    fn two_level_table() -> LevelTable {
        LevelTable::new(BTreeMap::from([(1, 0), (2, 100)]))
    }

    #[test]
    fn award_adds_exactly_delta_and_detects_level_up() {
        let table = two_level_table();
        let mut rec = record();

        let outcome = award(&table, &mut rec, 100, XpReason::Kill).unwrap();
        assert_eq!(rec.total_xp, 100);
        assert_eq!(outcome.old_level, 1);
        assert_eq!(outcome.new_level, 2);
        assert!(outcome.leveled_up);

        let outcome = award(&table, &mut rec, 1, XpReason::Kill).unwrap();
        assert_eq!(rec.total_xp, 101);
        assert!(!outcome.leveled_up);
        assert!(outcome.new_level >= outcome.old_level);
    }

    #[test]
    fn award_rejects_non_positive_deltas() {
        let table = two_level_table();
        let mut rec = record();
        rec.total_xp = 50;

        assert_eq!(
            award(&table, &mut rec, 0, XpReason::TeamWin),
            Err(XpError::NonPositiveDelta(0))
        );
        assert_eq!(
            award(&table, &mut rec, -25, XpReason::TeamWin),
            Err(XpError::NonPositiveDelta(-25))
        );
        // Rejected, not clamped: the record is untouched.
        assert_eq!(rec.total_xp, 50);
    }

    fn kill_five_catalog() -> TaskCatalog {
        TaskCatalog::new(vec![TaskDefinition {
            id: "K5".to_string(),
            description: "Kill 5 D-Class".to_string(),
            enabled: true,
            xp_reward: 200,
            round_scoped: true,
            objective: TaskObjective::KillCount {
                team: Team::ClassD,
                required: 5,
            },
        }])
    }

    fn assign(rec: &mut PlayerRecord, ids: &[&str]) {
        rec.install_assignment(
            DailyAssignment {
                task_ids: ids.iter().map(|id| (*id).to_string()).collect(),
                progress: ids.iter().map(|id| ((*id).to_string(), 0)).collect(),
            },
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        );
    }

    #[test]
    fn kill_count_task_completes_exactly_once_at_threshold() {
        let catalog = kill_five_catalog();
        let mut rec = record();
        assign(&mut rec, &["K5"]);
        rec.daily_task_progress.insert("K5".into(), 4);

        let qualifying = TaskEvent::Kill {
            victim: Role::ClassD,
            item: None,
        };
        let completions = apply_task_event(&catalog, &mut rec, &qualifying);
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].task_id, "K5");
        assert_eq!(completions[0].xp_reward, 200);
        assert!(rec.completed_task_ids.contains("K5"));
        assert_eq!(rec.daily_task_progress.get("K5"), Some(&5));

        // Further qualifying kills neither advance nor retrigger.
        let completions = apply_task_event(&catalog, &mut rec, &qualifying);
        assert!(completions.is_empty());
        assert_eq!(rec.daily_task_progress.get("K5"), Some(&5));
    }

    #[test]
    fn non_qualifying_kills_do_not_advance() {
        let catalog = kill_five_catalog();
        let mut rec = record();
        assign(&mut rec, &["K5"]);

        let completions = apply_task_event(
            &catalog,
            &mut rec,
            &TaskEvent::Kill {
                victim: Role::Scientist,
                item: None,
            },
        );
        assert!(completions.is_empty());
        assert_eq!(rec.daily_task_progress.get("K5"), Some(&0));
    }

    #[test]
    fn kill_with_item_requires_the_item() {
        let catalog = TaskCatalog::new(vec![TaskDefinition {
            id: "MH".to_string(),
            description: "Kill an SCP with the MicroHID".to_string(),
            enabled: true,
            xp_reward: 300,
            round_scoped: true,
            objective: TaskObjective::KillWithItem {
                team: Team::Scps,
                item: ItemKind::MicroHid,
            },
        }]);
        let mut rec = record();
        assign(&mut rec, &["MH"]);

        let wrong_item = TaskEvent::Kill {
            victim: Role::Scp,
            item: Some(ItemKind::Firearm),
        };
        assert!(apply_task_event(&catalog, &mut rec, &wrong_item).is_empty());

        let bare_hands = TaskEvent::Kill {
            victim: Role::Scp,
            item: None,
        };
        assert!(apply_task_event(&catalog, &mut rec, &bare_hands).is_empty());

        let with_microhid = TaskEvent::Kill {
            victim: Role::Scp,
            item: Some(ItemKind::MicroHid),
        };
        let completions = apply_task_event(&catalog, &mut rec, &with_microhid);
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].xp_reward, 300);
    }

    #[test]
    fn restrain_and_fall_death_objectives() {
        let catalog = TaskCatalog::default();
        let mut rec = record();
        assign(&mut rec, &["TieChaos", "DieFallDamage"]);

        let tie = apply_task_event(
            &catalog,
            &mut rec,
            &TaskEvent::Restrain {
                victim: Role::ChaosInsurgent,
            },
        );
        assert_eq!(tie.len(), 1);
        assert_eq!(tie[0].task_id, "TieChaos");

        let fall = apply_task_event(&catalog, &mut rec, &TaskEvent::FallDeath);
        assert_eq!(fall.len(), 1);
        assert_eq!(fall[0].task_id, "DieFallDamage");
    }

    #[test]
    fn unknown_task_ids_are_skipped_without_error() {
        let catalog = kill_five_catalog();
        let mut rec = record();
        // Record still references a task removed from the catalog.
        assign(&mut rec, &["RemovedTask", "K5"]);

        let completions = apply_task_event(
            &catalog,
            &mut rec,
            &TaskEvent::Kill {
                victim: Role::ClassD,
                item: None,
            },
        );
        assert!(completions.is_empty());
        assert_eq!(rec.daily_task_progress.get("K5"), Some(&1));
        assert_eq!(rec.daily_task_progress.get("RemovedTask"), Some(&0));
    }

    #[test]
    fn one_event_can_complete_multiple_tasks() {
        let catalog = TaskCatalog::new(vec![
            TaskDefinition {
                id: "K1".to_string(),
                description: "Kill a D-Class".to_string(),
                enabled: true,
                xp_reward: 10,
                round_scoped: false,
                objective: TaskObjective::KillCount {
                    team: Team::ClassD,
                    required: 1,
                },
            },
            TaskDefinition {
                id: "K1b".to_string(),
                description: "Also kill a D-Class".to_string(),
                enabled: true,
                xp_reward: 20,
                round_scoped: false,
                objective: TaskObjective::KillCount {
                    team: Team::ClassD,
                    required: 1,
                },
            },
        ]);
        let mut rec = record();
        assign(&mut rec, &["K1", "K1b"]);

        let completions = apply_task_event(
            &catalog,
            &mut rec,
            &TaskEvent::Kill {
                victim: Role::ClassD,
                item: None,
            },
        );
        assert_eq!(completions.len(), 2);
    }
}
