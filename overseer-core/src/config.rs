//! Service configuration
use crate::roles::Role;
use crate::tasks::DEFAULT_DAILY_TASK_COUNT;
use serde::{Deserialize, Serialize};

/// Tunables for the progression service.
///
/// Values are plain signed integers so an operator typo (a negative award)
/// travels to the award boundary, where it is rejected with a diagnostic
/// instead of being silently clamped here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// XP for kills, keyed by the victim's role.
    pub enable_kill_xp: bool,
    pub kill_xp_class_d: i64,
    pub kill_xp_scientist: i64,
    pub kill_xp_guard: i64,
    pub kill_xp_ntf: i64,
    pub kill_xp_chaos: i64,
    pub kill_xp_scp: i64,
    /// Paid for victims outside the table (tutorial players and the like).
    pub kill_xp_fallback: i64,

    /// Periodic XP for simply being on the server.
    pub enable_time_played_xp: bool,
    pub time_played_xp_amount: i64,
    /// Minimum seconds between two time-played grants for one player.
    pub time_played_interval_secs: u64,
    /// How often the online-XP tick fires while a round is running.
    pub online_xp_poll_secs: u64,

    pub enable_team_win_xp: bool,
    pub team_win_xp_amount: i64,

    pub enable_daily_tasks: bool,
    pub daily_task_count: usize,
    /// Seconds after round start before the daily-task reminder shows.
    pub reminder_delay_secs: u64,
}

impl ProgressionConfig {
    /// Kill XP for a victim of the given role. Guards score separately
    /// from NTF operatives even though they share a team.
    #[must_use]
    pub const fn kill_xp_for(&self, victim: Role) -> i64 {
        match victim {
            Role::ClassD => self.kill_xp_class_d,
            Role::Scientist => self.kill_xp_scientist,
            Role::FacilityGuard => self.kill_xp_guard,
            Role::NtfOperative => self.kill_xp_ntf,
            Role::ChaosInsurgent => self.kill_xp_chaos,
            Role::Scp => self.kill_xp_scp,
            Role::Tutorial => self.kill_xp_fallback,
        }
    }

    /// Parse a config document, falling back to defaults on any fault.
    /// A malformed config must never keep the service from starting.
    #[must_use]
    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(config) => config,
            Err(err) => {
                log::error!("malformed progression config, using defaults: {err}");
                Self::default()
            }
        }
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            enable_kill_xp: true,
            kill_xp_class_d: 10,
            kill_xp_scientist: 10,
            kill_xp_guard: 20,
            kill_xp_ntf: 30,
            kill_xp_chaos: 30,
            kill_xp_scp: 350,
            kill_xp_fallback: 10,
            enable_time_played_xp: true,
            time_played_xp_amount: 5,
            time_played_interval_secs: 300,
            online_xp_poll_secs: 30,
            enable_team_win_xp: true,
            team_win_xp_amount: 50,
            enable_daily_tasks: true,
            daily_task_count: DEFAULT_DAILY_TASK_COUNT,
            reminder_delay_secs: 60,
        }
    }
}
