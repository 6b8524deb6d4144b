//! Host event integration for the progression core
use crate::config::ProgressionConfig;
use crate::level::{LevelStatus, LevelTable};
use crate::roles::{ItemKind, Role, WinningSide};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::storage::{RecordStorage, Tier};
use crate::store::ProgressionStore;
use crate::tasks::{TaskCatalog, assign_daily_tasks};
use crate::xp::{self, AwardOutcome, TaskEvent, XpReason, apply_task_event};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const HINT_DURATION_SECS: f32 = 3.0;
const REMINDER_DURATION_SECS: f32 = 5.0;
const DAILY_TASK_REMINDER: &str =
    "You have daily tasks! Type 'tasks' in the console to see them.";

/// Display sink for transient on-screen messages. Rendering and rich
/// templating live on the host side of this boundary.
pub trait HintSink {
    fn show_hint(&mut self, user_id: &str, text: &str, duration_secs: f32);
}

/// A currently-connected, verified player as reported by the host
/// directory query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlinePlayer {
    pub user_id: String,
    /// Current role, when the player has spawned into one.
    pub role: Option<Role>,
}

impl OnlinePlayer {
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}

/// One row of the "my tasks" query surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTaskStatus {
    pub task_id: String,
    pub description: String,
    pub xp_reward: u64,
    pub completed: bool,
}

/// Timer concerns the service keeps with the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    DailyTaskReminder,
    OnlineXpTick,
}

/// Binds the store, level table, task catalog, and scheduler into the
/// event-facing surface the host drives.
///
/// Every collaborator is injected at construction; nothing is reached
/// through ambient globals. All methods run on the host's single logical
/// thread and take the current time as an argument, so the service itself
/// never reads a clock.
#[derive(Debug)]
pub struct ProgressionService<S: RecordStorage> {
    config: ProgressionConfig,
    levels: LevelTable,
    catalog: TaskCatalog,
    store: ProgressionStore<S>,
    scheduler: Scheduler<TimerEvent>,
    rng: SmallRng,
    reminder_timer: Option<TimerHandle>,
    online_xp_timer: Option<TimerHandle>,
    round_active: bool,
}

impl<S: RecordStorage> ProgressionService<S> {
    /// Build the service and load both record tiers from storage.
    pub fn new(
        config: ProgressionConfig,
        levels: LevelTable,
        catalog: TaskCatalog,
        storage: S,
        seed: u64,
    ) -> Self {
        let mut store = ProgressionStore::new(storage);
        store.load();
        Self {
            config,
            levels,
            catalog,
            store,
            scheduler: Scheduler::new(),
            rng: SmallRng::seed_from_u64(seed),
            reminder_timer: None,
            online_xp_timer: None,
            round_active: false,
        }
    }

    /// The player connected but has not authenticated yet. Record work
    /// waits for [`Self::on_player_verified`]; this only logs the arrival.
    pub fn on_player_joined(&self, user_id: &str, nickname: &str) {
        log::debug!("player joined: {user_id} ({nickname})");
    }

    /// The player finished authenticating: materialize their record,
    /// capture the original nickname once, and roll a fresh daily task set
    /// when a new day has begun or the stored set is short.
    pub fn on_player_verified(&mut self, user_id: &str, nickname: &str, now: DateTime<Utc>) {
        let today = now.date_naive();
        let count = self.config.daily_task_count;
        let tasks_enabled = self.config.enable_daily_tasks;

        let record = self.store.get(user_id, now);
        let mut dirty = record.note_original_nickname(nickname);

        if tasks_enabled && record.needs_daily_regen(today, count) {
            let assignment = assign_daily_tasks(&self.catalog, count, &mut self.rng);
            log::debug!(
                "rolled daily tasks for {user_id}: {}",
                assignment.task_ids.join(", ")
            );
            record.install_assignment(assignment, today);
            dirty = true;
        }

        if dirty {
            self.store.persist(Tier::Hot);
        }
    }

    /// The player left: write their record back to the cold tier and evict
    /// it from the hot tier.
    pub fn on_player_disconnected(&mut self, user_id: &str) {
        self.store.release(user_id);
    }

    /// A player died. Attacker-less and self-inflicted deaths carry no
    /// progression consequences here (fall deaths arrive separately via
    /// [`Self::on_fall_death`]).
    pub fn on_player_died(
        &mut self,
        victim_id: &str,
        victim_role: Role,
        attacker: Option<(&str, Role)>,
        item: Option<ItemKind>,
        now: DateTime<Utc>,
        sink: &mut dyn HintSink,
    ) {
        let Some((attacker_id, _)) = attacker else {
            return;
        };
        if attacker_id == victim_id {
            return;
        }

        if self.config.enable_kill_xp {
            let amount = self.config.kill_xp_for(victim_role);
            if amount != 0 {
                self.grant_xp(attacker_id, amount, XpReason::Kill, now, sink);
            }
        }

        if self.config.enable_daily_tasks {
            let event = TaskEvent::Kill {
                victim: victim_role,
                item,
            };
            let record = self.store.get(attacker_id, now);
            let completions = apply_task_event(&self.catalog, record, &event);
            for completion in completions {
                let reward = i64::try_from(completion.xp_reward).unwrap_or(i64::MAX);
                self.grant_xp(attacker_id, reward, XpReason::TaskCompleted, now, sink);
            }
        }

        self.store.persist(Tier::Hot);
    }

    /// The player died from fall damage (victim-side task fact).
    pub fn on_fall_death(&mut self, victim_id: &str, now: DateTime<Utc>, sink: &mut dyn HintSink) {
        if !self.config.enable_daily_tasks {
            return;
        }
        let record = self.store.get(victim_id, now);
        let completions = apply_task_event(&self.catalog, record, &TaskEvent::FallDeath);
        for completion in completions {
            let reward = i64::try_from(completion.xp_reward).unwrap_or(i64::MAX);
            self.grant_xp(victim_id, reward, XpReason::TaskCompleted, now, sink);
        }
        self.store.persist(Tier::Hot);
    }

    /// The player restrained (cuffed) a victim.
    pub fn on_player_restrained(
        &mut self,
        attacker_id: &str,
        victim_role: Role,
        now: DateTime<Utc>,
        sink: &mut dyn HintSink,
    ) {
        if !self.config.enable_daily_tasks {
            return;
        }
        let event = TaskEvent::Restrain {
            victim: victim_role,
        };
        let record = self.store.get(attacker_id, now);
        let completions = apply_task_event(&self.catalog, record, &event);
        for completion in completions {
            let reward = i64::try_from(completion.xp_reward).unwrap_or(i64::MAX);
            self.grant_xp(attacker_id, reward, XpReason::TaskCompleted, now, sink);
        }
        self.store.persist(Tier::Hot);
    }

    /// A new round began: restart the daily-task reminder, zero round-scoped
    /// progress across the hot tier, and start the online-XP tick. Restart
    /// is idempotent; any prior timer instance is cancelled first.
    pub fn on_round_started(&mut self, now: DateTime<Utc>) {
        self.round_active = true;

        if self.config.enable_daily_tasks {
            if let Some(handle) = self.reminder_timer.take() {
                self.scheduler.cancel(handle);
            }
            self.reminder_timer = Some(self.scheduler.schedule_once(
                now,
                Duration::from_secs(self.config.reminder_delay_secs),
                TimerEvent::DailyTaskReminder,
            ));
        }

        self.store
            .reset_round_scoped(&self.catalog.round_scoped_ids());

        if self.config.enable_time_played_xp {
            if let Some(handle) = self.online_xp_timer.take() {
                self.scheduler.cancel(handle);
            }
            self.online_xp_timer = Some(self.scheduler.schedule_repeating(
                now,
                Duration::from_secs(self.config.online_xp_poll_secs),
                TimerEvent::OnlineXpTick,
            ));
        }
    }

    /// The round ended: pay team-win XP to the winners and stop the
    /// online-XP tick so it cannot leak into the lobby.
    pub fn on_round_ended(
        &mut self,
        winning_side: WinningSide,
        online: &[OnlinePlayer],
        now: DateTime<Utc>,
        sink: &mut dyn HintSink,
    ) {
        self.round_active = false;

        if self.config.enable_team_win_xp && winning_side != WinningSide::Draw {
            let amount = self.config.team_win_xp_amount;
            for player in online {
                let on_winning_side = player
                    .role
                    .and_then(Role::winning_side)
                    .is_some_and(|side| side == winning_side);
                if on_winning_side && amount != 0 {
                    self.grant_xp(&player.user_id, amount, XpReason::TeamWin, now, sink);
                }
            }
            self.store.persist(Tier::Hot);
        }

        if let Some(handle) = self.online_xp_timer.take() {
            self.scheduler.cancel(handle);
        }
    }

    /// Pump due timers. The host calls this from its event loop with the
    /// current time and directory of connected, verified players.
    pub fn tick(&mut self, now: DateTime<Utc>, online: &[OnlinePlayer], sink: &mut dyn HintSink) {
        for event in self.scheduler.poll(now) {
            match event {
                TimerEvent::DailyTaskReminder => {
                    self.reminder_timer = None;
                    if self.config.enable_daily_tasks {
                        for player in online {
                            sink.show_hint(
                                &player.user_id,
                                DAILY_TASK_REMINDER,
                                REMINDER_DURATION_SECS,
                            );
                        }
                    }
                }
                TimerEvent::OnlineXpTick => self.grant_online_xp(now, online, sink),
            }
        }
    }

    /// Pay the time-played XP to every online player whose last grant is at
    /// least the configured interval old, then persist the hot tier once.
    fn grant_online_xp(
        &mut self,
        now: DateTime<Utc>,
        online: &[OnlinePlayer],
        sink: &mut dyn HintSink,
    ) {
        if !self.round_active || !self.config.enable_time_played_xp {
            return;
        }
        let Ok(interval) =
            chrono::Duration::from_std(Duration::from_secs(self.config.time_played_interval_secs))
        else {
            return;
        };

        for player in online {
            let due = {
                let record = self.store.get(&player.user_id, now);
                now.signed_duration_since(record.last_xp_grant) >= interval
            };
            if !due {
                continue;
            }
            let granted = self
                .grant_xp(
                    &player.user_id,
                    self.config.time_played_xp_amount,
                    XpReason::TimePlayed,
                    now,
                    sink,
                )
                .is_some();
            if granted {
                self.store.get(&player.user_id, now).last_xp_grant = now;
            }
        }

        self.store.persist(Tier::Hot);
    }

    /// Award XP with hints for the grant and any level-up crossing.
    /// Returns `None` when the award was rejected at the boundary.
    fn grant_xp(
        &mut self,
        user_id: &str,
        delta: i64,
        reason: XpReason,
        now: DateTime<Utc>,
        sink: &mut dyn HintSink,
    ) -> Option<AwardOutcome> {
        let record = self.store.get(user_id, now);
        let outcome = xp::award(&self.levels, record, delta, reason).ok()?;

        sink.show_hint(user_id, &xp_hint(reason, outcome.amount), HINT_DURATION_SECS);
        if outcome.leveled_up {
            sink.show_hint(
                user_id,
                &format!("You have leveled up to level {}!", outcome.new_level),
                HINT_DURATION_SECS,
            );
        }
        Some(outcome)
    }

    /// Level snapshot for the "my level" inquiry. `None` for identities the
    /// server has never seen.
    #[must_use]
    pub fn level_status(&self, user_id: &str) -> Option<LevelStatus> {
        self.store
            .peek_hot(user_id)
            .or_else(|| self.store.peek_cold(user_id))
            .map(|record| self.levels.status_for_xp(record.total_xp))
    }

    /// Current daily task list for the "my tasks" inquiry. Ids missing from
    /// the catalog are skipped; unknown identities yield an empty list.
    #[must_use]
    pub fn daily_tasks(&self, user_id: &str) -> Vec<DailyTaskStatus> {
        let Some(record) = self
            .store
            .peek_hot(user_id)
            .or_else(|| self.store.peek_cold(user_id))
        else {
            return Vec::new();
        };

        record
            .daily_task_ids
            .iter()
            .filter_map(|task_id| self.catalog.find(task_id))
            .map(|definition| DailyTaskStatus {
                task_id: definition.id.clone(),
                description: definition.description.clone(),
                xp_reward: definition.xp_reward,
                completed: record.completed_task_ids.contains(&definition.id),
            })
            .collect()
    }

    /// Flush both tiers, e.g. at server shutdown.
    pub fn shutdown(&mut self) {
        self.store.persist_all();
    }

    #[must_use]
    pub const fn store(&self) -> &ProgressionStore<S> {
        &self.store
    }

    /// Consume the service, returning the storage backend.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.store.into_storage()
    }

    #[must_use]
    pub const fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    #[must_use]
    pub const fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn round_active(&self) -> bool {
        self.round_active
    }
}

fn xp_hint(reason: XpReason, amount: u64) -> String {
    match reason {
        XpReason::Kill => format!("You received {amount} XP for killing a player!"),
        XpReason::TimePlayed => {
            format!("You received {amount} XP for playing on the server!")
        }
        XpReason::TeamWin => format!("You received {amount} XP for your team's victory!"),
        XpReason::TaskCompleted => {
            format!("You completed a daily task and earned {amount} XP!")
        }
    }
}
