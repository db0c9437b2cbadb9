use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall-clock time driven by the tokio clock, so paused tests can move
/// calendar time with `tokio::time::advance`.
#[cfg(feature = "test-util")]
pub struct TokioClock {
    base: DateTime<Utc>,
    origin: tokio::time::Instant,
}

#[cfg(feature = "test-util")]
impl TokioClock {
    pub fn starting_at(base: DateTime<Utc>) -> Self {
        Self {
            base,
            origin: tokio::time::Instant::now(),
        }
    }
}

#[cfg(feature = "test-util")]
impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::TimeDelta::from_std(self.origin.elapsed())
            .expect("Test clock never runs that far.");
        self.base + elapsed
    }
}
