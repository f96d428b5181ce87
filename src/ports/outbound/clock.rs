use chrono::{DateTime, Utc};

/// Clock port so staleness can be tested without sleeping
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
