//! Habit notification scheduler
//!
//! Best-effort local reminders, one armed timer per habit. Each timer
//! sleeps until the next occurrence of the habit's "HH:MM" wall-clock
//! time, fires a notification, and re-arms itself for the following day.
//! Timers live in memory only and do not survive a restart.

use crate::config::{NOTIFICATION_TIME_FORMAT, REMINDER_BODY};
use crate::database::Habit;
use crate::error::{AppError, Result};
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Platform notification capability.
///
/// Feature detection and permission state live behind this trait so the
/// scheduler can degrade to a no-op when notifications are unavailable.
pub trait Notifier: Send + Sync + 'static {
    /// Whether the platform supports notifications at all
    fn is_supported(&self) -> bool;

    /// Whether the user has granted notification permission
    fn permission_granted(&self) -> bool;

    /// Deliver a notification. Best-effort; failures are the notifier's
    /// problem to log.
    fn notify(&self, title: &str, body: &str);
}

/// Notifier that writes to the log. Used headless and in tests.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission_granted(&self) -> bool {
        true
    }

    fn notify(&self, title: &str, body: &str) {
        tracing::info!("Notification: {} - {}", title, body);
    }
}

/// Compute the delay until the next occurrence of a wall-clock time:
/// today if the target is still ahead of `now`, otherwise tomorrow.
/// The boundary case (target exactly `now`) rolls to tomorrow, which is
/// what a timer that just fired needs for its re-arm.
pub fn next_delay(now: NaiveDateTime, target: NaiveTime) -> std::time::Duration {
    let today_target = now.date().and_time(target);
    let next = if today_target > now {
        today_target
    } else {
        today_target + ChronoDuration::days(1)
    };

    (next - now).to_std().unwrap_or_default()
}

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Owns every armed reminder timer, keyed by habit id.
pub struct NotificationScheduler {
    notifier: Arc<dyn Notifier>,
    clock: Clock,
    timers: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl NotificationScheduler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::with_clock(notifier, Arc::new(|| Local::now().naive_local()))
    }

    // Timers re-read the clock on every re-arm, so tests can pin it.
    fn with_clock(notifier: Arc<dyn Notifier>, clock: Clock) -> Self {
        Self {
            notifier,
            clock,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Arm a daily reminder for one habit.
    ///
    /// Returns false without arming anything when notifications are
    /// unsupported or permission has not been granted; surfacing the
    /// denial to the user is the caller's job. Scheduling a habit that
    /// already has a timer replaces the old one.
    pub fn schedule(&self, habit_id: &str, title: &str, time: &str) -> Result<bool> {
        if !self.notifier.is_supported() {
            tracing::debug!("Notifications unsupported; not scheduling {}", habit_id);
            return Ok(false);
        }
        if !self.notifier.permission_granted() {
            tracing::debug!("Notification permission not granted; not scheduling {}", habit_id);
            return Ok(false);
        }

        let target = NaiveTime::parse_from_str(time, NOTIFICATION_TIME_FORMAT)
            .map_err(|_| AppError::Validation(format!("Invalid notification time: {}", time)))?;

        let notifier = Arc::clone(&self.notifier);
        let clock = Arc::clone(&self.clock);
        let habit_title = title.to_string();
        let id = habit_id.to_string();

        let handle = tokio::spawn(async move {
            loop {
                let delay = next_delay(clock(), target);
                tokio::time::sleep(delay).await;

                tracing::info!("Reminder fired for habit {}", id);
                notifier.notify(&habit_title, REMINDER_BODY);
                // Loop re-arms for the same time tomorrow
            }
        });

        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = timers.insert(habit_id.to_string(), handle) {
            old.abort();
        }

        tracing::debug!("Scheduled reminder for habit {} at {}", habit_id, time);
        Ok(true)
    }

    /// Clear the pending timer for one habit, if any. Idempotent.
    pub fn cancel(&self, habit_id: &str) {
        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = timers.remove(habit_id) {
            handle.abort();
            tracing::debug!("Cancelled reminder for habit {}", habit_id);
        }
    }

    /// Clear every pending timer. Used on teardown and before a full
    /// re-initialization.
    pub fn cancel_all(&self) {
        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        for (_, handle) in timers.drain() {
            handle.abort();
        }
        tracing::debug!("Cancelled all reminders");
    }

    /// Cancel everything, then schedule each habit with notifications
    /// enabled. Safe to call whenever the habit set changes.
    pub fn initialize_all(&self, habits: &[Habit]) {
        self.cancel_all();

        for habit in habits {
            if !habit.notification_enabled {
                continue;
            }
            let Some(time) = habit.notification_time.as_deref() else {
                continue;
            };
            if let Err(e) = self.schedule(&habit.id, &habit.title, time) {
                tracing::warn!("Could not schedule reminder for {}: {}", habit.id, e);
            }
        }
    }

    /// Whether a timer is armed for this habit
    pub fn is_armed(&self, habit_id: &str) -> bool {
        let timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        timers.contains_key(habit_id)
    }

    /// Number of armed timers
    pub fn armed_count(&self) -> usize {
        let timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        timers.len()
    }
}

impl Drop for NotificationScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockNotifier {
        supported: bool,
        granted: bool,
    }

    impl MockNotifier {
        fn new(supported: bool, granted: bool) -> Self {
            Self { supported, granted }
        }
    }

    impl Notifier for MockNotifier {
        fn is_supported(&self) -> bool {
            self.supported
        }

        fn permission_granted(&self) -> bool {
            self.granted
        }

        fn notify(&self, _title: &str, _body: &str) {}
    }

    #[derive(Default)]
    struct CountingNotifier {
        delivered: AtomicUsize,
    }

    impl Notifier for CountingNotifier {
        fn is_supported(&self) -> bool {
            true
        }

        fn permission_granted(&self) -> bool {
            true
        }

        fn notify(&self, _title: &str, _body: &str) {
            self.delivered.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_next_delay_today_when_ahead() {
        let now = at(8, 0, 0);
        let target = NaiveTime::from_hms_opt(9, 30, 0).unwrap();

        let delay = next_delay(now, target);
        assert_eq!(delay.as_secs(), 90 * 60);
    }

    #[test]
    fn test_next_delay_tomorrow_when_past() {
        let now = at(10, 0, 0);
        let target = NaiveTime::from_hms_opt(9, 30, 0).unwrap();

        let delay = next_delay(now, target);
        assert_eq!(delay.as_secs(), 23 * 3600 + 30 * 60);
    }

    #[test]
    fn test_next_delay_exact_time_rolls_to_tomorrow() {
        let now = at(9, 30, 0);
        let target = NaiveTime::from_hms_opt(9, 30, 0).unwrap();

        let delay = next_delay(now, target);
        assert_eq!(delay.as_secs(), 24 * 3600);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fired_reminder_delivers_and_rearms() {
        let notifier = Arc::new(CountingNotifier::default());
        // Pinned clock: the next 09:00 is always one hour away
        let scheduler = NotificationScheduler::with_clock(
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Arc::new(|| at(8, 0, 0)),
        );

        scheduler.schedule("h1", "Drink water", "09:00").unwrap();
        assert_eq!(notifier.delivered.load(Ordering::SeqCst), 0);

        // Past the first occurrence: one delivery, timer still armed
        tokio::time::sleep(Duration::from_secs(3600 + 1)).await;
        assert_eq!(notifier.delivered.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.armed_count(), 1);

        // Past the next occurrence: exactly one more delivery
        tokio::time::sleep(Duration::from_secs(3600 + 1)).await;
        assert_eq!(notifier.delivered.load(Ordering::SeqCst), 2);
        assert!(scheduler.is_armed("h1"));
    }

    #[tokio::test]
    async fn test_schedule_and_cancel() {
        let scheduler = NotificationScheduler::new(Arc::new(MockNotifier::new(true, true)));

        let armed = scheduler.schedule("h1", "Drink water", "08:00").unwrap();
        assert!(armed);
        assert!(scheduler.is_armed("h1"));

        scheduler.cancel("h1");
        assert!(!scheduler.is_armed("h1"));

        // Cancelling again is fine
        scheduler.cancel("h1");
    }

    #[tokio::test]
    async fn test_reschedule_replaces_timer() {
        let scheduler = NotificationScheduler::new(Arc::new(MockNotifier::new(true, true)));

        scheduler.schedule("h1", "Drink water", "08:00").unwrap();
        scheduler.schedule("h1", "Drink water", "09:00").unwrap();

        assert_eq!(scheduler.armed_count(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_platform_is_noop() {
        let scheduler = NotificationScheduler::new(Arc::new(MockNotifier::new(false, true)));

        let armed = scheduler.schedule("h1", "Drink water", "08:00").unwrap();
        assert!(!armed);
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[tokio::test]
    async fn test_denied_permission_is_noop() {
        let scheduler = NotificationScheduler::new(Arc::new(MockNotifier::new(true, false)));

        let armed = scheduler.schedule("h1", "Drink water", "08:00").unwrap();
        assert!(!armed);
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_time_rejected() {
        let scheduler = NotificationScheduler::new(Arc::new(MockNotifier::new(true, true)));

        assert!(scheduler.schedule("h1", "Drink water", "25:99").is_err());
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let scheduler = NotificationScheduler::new(Arc::new(MockNotifier::new(true, true)));

        scheduler.schedule("h1", "One", "08:00").unwrap();
        scheduler.schedule("h2", "Two", "09:00").unwrap();
        assert_eq!(scheduler.armed_count(), 2);

        scheduler.cancel_all();
        assert_eq!(scheduler.armed_count(), 0);
    }
}
