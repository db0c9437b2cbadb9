mod supervisor;

pub use supervisor::{ReminderSupervisor, TimerState, tick::TickOutcome};
