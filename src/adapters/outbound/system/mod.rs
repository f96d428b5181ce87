use crate::ports::outbound::Clock;
use chrono::{DateTime, Utc};

/// SystemClock adapter reading the wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
