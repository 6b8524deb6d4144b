//! Task catalog and daily task assignment
use crate::roles::{ItemKind, Team};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How many tasks a player is assigned per day unless configured otherwise.
pub const DEFAULT_DAILY_TASK_COUNT: usize = 3;

/// What a task asks the player to do, and when it counts as done.
///
/// Objectives are data, not code: adding a task to the catalog must never
/// require touching the event handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskObjective {
    /// Kill `required` players belonging to `team`.
    KillCount { team: Team, required: u32 },
    /// Kill one player of `team` while holding `item`.
    KillWithItem { team: Team, item: ItemKind },
    /// Restrain `required` players belonging to `team`.
    RestrainCount { team: Team, required: u32 },
    /// Die from fall damage once.
    FallDeath,
}

impl TaskObjective {
    /// Progress threshold at which the task completes.
    #[must_use]
    pub const fn required(&self) -> u32 {
        match self {
            Self::KillCount { required, .. } | Self::RestrainCount { required, .. } => *required,
            Self::KillWithItem { .. } | Self::FallDeath => 1,
        }
    }
}

/// A single entry in the task catalog. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: String,
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub xp_reward: u64,
    /// Progress resets to zero at every round start unless already complete.
    #[serde(default)]
    pub round_scoped: bool,
    pub objective: TaskObjective,
}

const fn default_enabled() -> bool {
    true
}

/// The set of tasks players can be assigned from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCatalog {
    pub tasks: Vec<TaskDefinition>,
}

impl TaskCatalog {
    #[must_use]
    pub const fn new(tasks: Vec<TaskDefinition>) -> Self {
        Self { tasks }
    }

    /// Empty catalog: the degraded state when task config cannot be read.
    #[must_use]
    pub const fn empty() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Parse a catalog document. An unreadable catalog degrades to the
    /// empty task list; assignment then simply hands out nothing.
    #[must_use]
    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(catalog) => catalog,
            Err(err) => {
                log::error!("malformed task catalog, degrading to empty: {err}");
                Self::empty()
            }
        }
    }

    /// Look up a definition by id. Unknown ids are a normal steady state
    /// (catalog edits must not corrupt existing records), hence `Option`.
    #[must_use]
    pub fn find(&self, task_id: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    /// Tasks currently eligible for assignment.
    #[must_use]
    pub fn enabled_tasks(&self) -> Vec<&TaskDefinition> {
        self.tasks.iter().filter(|task| task.enabled).collect()
    }

    /// Ids of every round-scoped task in the catalog.
    #[must_use]
    pub fn round_scoped_ids(&self) -> HashSet<String> {
        self.tasks
            .iter()
            .filter(|task| task.round_scoped)
            .map(|task| task.id.clone())
            .collect()
    }
}

impl Default for TaskCatalog {
    fn default() -> Self {
        Self::new(vec![
            TaskDefinition {
                id: "Kill5DclassOneRound".to_string(),
                description: "Kill 5 D-Class in one round".to_string(),
                enabled: true,
                xp_reward: 200,
                round_scoped: true,
                objective: TaskObjective::KillCount {
                    team: Team::ClassD,
                    required: 5,
                },
            },
            TaskDefinition {
                id: "KillScpMicrohid".to_string(),
                description: "Kill an SCP using the MicroHID".to_string(),
                enabled: true,
                xp_reward: 300,
                round_scoped: true,
                objective: TaskObjective::KillWithItem {
                    team: Team::Scps,
                    item: ItemKind::MicroHid,
                },
            },
            TaskDefinition {
                id: "TieChaos".to_string(),
                description: "Tie a Chaos Insurgent".to_string(),
                enabled: true,
                xp_reward: 150,
                round_scoped: true,
                objective: TaskObjective::RestrainCount {
                    team: Team::ChaosInsurgency,
                    required: 1,
                },
            },
            TaskDefinition {
                id: "TieGuard".to_string(),
                description: "Tie a Guard".to_string(),
                enabled: true,
                xp_reward: 100,
                round_scoped: true,
                objective: TaskObjective::RestrainCount {
                    team: Team::FoundationForces,
                    required: 1,
                },
            },
            TaskDefinition {
                id: "DieFallDamage".to_string(),
                description: "Die from fall damage in one round".to_string(),
                enabled: true,
                xp_reward: 50,
                round_scoped: true,
                objective: TaskObjective::FallDeath,
            },
        ])
    }
}

/// A freshly rolled daily task set, ready to install on a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyAssignment {
    pub task_ids: Vec<String>,
    pub progress: HashMap<String, u32>,
}

/// Pick `count` distinct enabled tasks uniformly at random.
///
/// Fewer enabled tasks than `count` is not an error: the player simply gets
/// all of them. The assigner is stateless and day-agnostic; the caller owns
/// the decision that a regeneration is due.
pub fn assign_daily_tasks<R: Rng>(
    catalog: &TaskCatalog,
    count: usize,
    rng: &mut R,
) -> DailyAssignment {
    let enabled = catalog.enabled_tasks();
    let chosen: Vec<&TaskDefinition> = enabled
        .choose_multiple(rng, count.min(enabled.len()))
        .copied()
        .collect();

    let task_ids: Vec<String> = chosen.iter().map(|task| task.id.clone()).collect();
    let progress = task_ids.iter().map(|id| (id.clone(), 0)).collect();
    DailyAssignment { task_ids, progress }
}
