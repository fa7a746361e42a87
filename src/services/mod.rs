//! Services module
//!
//! Business logic services that coordinate between callers and the
//! repository.

pub mod assistant;
pub mod habits;
pub mod reading;
pub mod scheduler;

pub use assistant::{parse_commands, Action, AssistantCommand, AssistantService, Entity};
pub use habits::{CheckState, HabitsService, TimerOutcome};
pub use reading::ReadingService;
pub use scheduler::{next_delay, LogNotifier, NotificationScheduler, Notifier};
