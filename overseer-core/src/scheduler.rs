//! Deterministic timer scheduling
//!
//! The host event loop owns real time; the core never sleeps. Components
//! register one-shot or repeating entries here and the host pumps [`Scheduler::poll`]
//! with the current time, receiving the events that came due. Cancellation
//! handles make restart idempotent: cancel the stored handle, then schedule
//! anew, and duplicate timers cannot exist.
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Identifies one scheduled entry. Stale handles (already fired or
/// cancelled) are harmless; cancelling them is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct TimerEntry<E> {
    handle: TimerHandle,
    fire_at: DateTime<Utc>,
    /// `Some` for repeating entries, which re-arm on every fire.
    interval: Option<Duration>,
    event: E,
}

/// Host-pumped timer queue.
#[derive(Debug)]
pub struct Scheduler<E> {
    next_handle: u64,
    entries: Vec<TimerEntry<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_handle: 0,
            entries: Vec::new(),
        }
    }

    fn allocate_handle(&mut self) -> TimerHandle {
        self.next_handle += 1;
        TimerHandle(self.next_handle)
    }

    fn arm(&mut self, fire_at: DateTime<Utc>, interval: Option<Duration>, event: E) -> TimerHandle {
        let handle = self.allocate_handle();
        self.entries.push(TimerEntry {
            handle,
            fire_at,
            interval,
            event,
        });
        handle
    }

    /// Run `event` once, `delay` after `now`.
    pub fn schedule_once(
        &mut self,
        now: DateTime<Utc>,
        delay: Duration,
        event: E,
    ) -> TimerHandle {
        self.arm(deadline(now, delay), None, event)
    }

    /// Run `event` every `interval`, first firing one interval after `now`,
    /// until the handle is cancelled.
    pub fn schedule_repeating(
        &mut self,
        now: DateTime<Utc>,
        interval: Duration,
        event: E,
    ) -> TimerHandle {
        self.arm(deadline(now, interval), Some(interval), event)
    }

    /// Remove an entry. Returns whether anything was actually cancelled;
    /// cancelling a fired or already-cancelled handle is a safe no-op.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.handle != handle);
        self.entries.len() != before
    }

    #[must_use]
    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|entry| entry.handle == handle)
    }

    /// Number of armed entries.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.entries.len()
    }
}

impl<E: Clone> Scheduler<E> {
    /// Collect every entry due at `now`, in deadline order. One-shots are
    /// dropped; repeating entries re-arm one interval from `now` (missed
    /// intervals collapse into a single firing rather than a burst).
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<E> {
        let mut due: Vec<(DateTime<Utc>, E)> = Vec::new();

        let mut kept = Vec::with_capacity(self.entries.len());
        for mut entry in self.entries.drain(..) {
            if entry.fire_at > now {
                kept.push(entry);
                continue;
            }
            due.push((entry.fire_at, entry.event.clone()));
            if let Some(interval) = entry.interval {
                entry.fire_at = deadline(now, interval);
                kept.push(entry);
            }
        }
        self.entries = kept;

        due.sort_by_key(|(fire_at, _)| *fire_at);
        due.into_iter().map(|(_, event)| event).collect()
    }
}

/// `now + duration`, saturating at the far end of representable time so an
/// absurd config value cannot panic the scheduler.
fn deadline(now: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Tick {
        Reminder,
        OnlineXp,
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn one_shot_fires_once_at_deadline() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule_once(t0(), secs(60), Tick::Reminder);

        assert!(scheduler.poll(t0() + chrono::Duration::seconds(59)).is_empty());
        assert!(scheduler.is_scheduled(handle));

        let fired = scheduler.poll(t0() + chrono::Duration::seconds(60));
        assert_eq!(fired, vec![Tick::Reminder]);
        assert!(!scheduler.is_scheduled(handle));
        assert!(scheduler.poll(t0() + chrono::Duration::seconds(600)).is_empty());
    }

    #[test]
    fn repeating_entry_rearms_until_cancelled() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule_repeating(t0(), secs(30), Tick::OnlineXp);

        let mut now = t0();
        for _ in 0..3 {
            now += chrono::Duration::seconds(30);
            assert_eq!(scheduler.poll(now), vec![Tick::OnlineXp]);
        }

        assert!(scheduler.cancel(handle));
        now += chrono::Duration::seconds(300);
        assert!(scheduler.poll(now).is_empty());
    }

    #[test]
    fn missed_intervals_collapse_into_one_firing() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(t0(), secs(30), Tick::OnlineXp);

        // Five intervals pass before the host pumps again.
        let fired = scheduler.poll(t0() + chrono::Duration::seconds(150));
        assert_eq!(fired, vec![Tick::OnlineXp]);
    }

    #[test]
    fn cancel_is_idempotent_and_ignores_stale_handles() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule_once(t0(), secs(10), Tick::Reminder);
        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
    }

    #[test]
    fn cancel_then_reschedule_leaves_a_single_timer() {
        let mut scheduler = Scheduler::new();
        let mut handle = scheduler.schedule_once(t0(), secs(60), Tick::Reminder);

        // Round restarts before the reminder fired: idempotent restart.
        scheduler.cancel(handle);
        handle = scheduler.schedule_once(t0() + chrono::Duration::seconds(5), secs(60), Tick::Reminder);

        assert_eq!(scheduler.pending(), 1);
        let fired = scheduler.poll(t0() + chrono::Duration::seconds(65));
        assert_eq!(fired, vec![Tick::Reminder]);
        assert!(!scheduler.is_scheduled(handle));
    }

    #[test]
    fn due_events_come_out_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(t0(), secs(50), Tick::OnlineXp);
        scheduler.schedule_once(t0(), secs(10), Tick::Reminder);

        let fired = scheduler.poll(t0() + chrono::Duration::seconds(60));
        assert_eq!(fired, vec![Tick::Reminder, Tick::OnlineXp]);
    }
}
