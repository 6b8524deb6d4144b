//! Overseer Progression Engine
//!
//! Platform-agnostic progression logic for a round-based multiplayer
//! facility server: XP and leveling, a two-tier (hot/cold) player record
//! store with write-back on departure, and a daily task system with
//! round-scoped objectives. The host game server delivers events and owns
//! real time; this crate holds no clocks, no threads, and no I/O beyond
//! the [`RecordStorage`] seam.

pub mod config;
pub mod level;
pub mod record;
pub mod roles;
pub mod scheduler;
pub mod service;
pub mod storage;
pub mod store;
pub mod tasks;
pub mod xp;

// Re-export commonly used types
pub use config::ProgressionConfig;
pub use level::{LevelStatus, LevelTable};
pub use record::PlayerRecord;
pub use roles::{ItemKind, Role, Team, WinningSide};
pub use scheduler::{Scheduler, TimerHandle};
pub use service::{DailyTaskStatus, HintSink, OnlinePlayer, ProgressionService};
pub use storage::{JsonFileStorage, MemoryStorage, RecordStorage, StorageError, Tier};
pub use store::ProgressionStore;
pub use tasks::{
    DEFAULT_DAILY_TASK_COUNT, DailyAssignment, TaskCatalog, TaskDefinition, TaskObjective,
    assign_daily_tasks,
};
pub use xp::{AwardOutcome, TaskCompletion, TaskEvent, XpError, XpReason, apply_task_event, award};
