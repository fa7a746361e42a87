//! Application configuration constants
//!
//! Central location for configuration constants, defaults, and
//! validation boundaries used throughout the engine.

// ===== Habit Defaults =====

/// Default number of checks per day for task-tracked habits
pub const DEFAULT_CHECKS_PER_DAY: i64 = 1;

/// Minimum streak length before the streak is surfaced in the UI.
/// Shorter streaks are tracked but not displayed.
pub const STREAK_DISPLAY_THRESHOLD: u32 = 3;

// ===== Goal Defaults =====

/// Default goal period when the caller omits one
pub const DEFAULT_GOAL_PERIOD: &str = "short";

// ===== Reading List =====

/// Status assigned to freshly added reading-list entries
pub const READING_STATUS_TO_READ: &str = "to_read";

/// Default result limit for book searches
pub const DEFAULT_BOOK_SEARCH_LIMIT: u32 = 10;

// ===== Notifications =====

/// Body text for habit reminder notifications
pub const REMINDER_BODY: &str = "Time to check in on your habit!";

/// Wall-clock format for habit notification times
pub const NOTIFICATION_TIME_FORMAT: &str = "%H:%M";

// ===== Validation Boundaries =====

/// Maximum length for titles across entities.
/// Prevents excessively long values from being stored.
pub const MAX_TITLE_LENGTH: usize = 500;
