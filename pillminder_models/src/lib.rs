pub mod clock;
pub mod dose_clock;
pub mod schedule;
pub mod settings;

pub use chrono;
pub use chrono_tz;
