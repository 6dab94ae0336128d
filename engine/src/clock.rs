//! Time source and local identifier allocation.
//!
//! Records created while the remote service is unreachable need an
//! identifier that cannot collide with anything already in the list. The
//! [`IdClock`] hands out timestamp-derived identifiers that are strictly
//! increasing, even when the wall clock stalls or goes backwards.

use crate::{RecordId, Timestamp};

/// Source of wall-clock time in milliseconds since the Unix epoch.
pub trait TimeSource: Send + Sync {
    fn now_millis(&self) -> Timestamp;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now_millis(&self) -> Timestamp {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl TimeSource for FixedClock {
    fn now_millis(&self) -> Timestamp {
        self.0
    }
}

/// Allocator for locally assigned identifiers.
///
/// Ordering rule: the next identifier is the larger of the current time and
/// one past the highest identifier ever observed or issued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdClock {
    last: RecordId,
}

impl IdClock {
    /// Create an allocator that has seen nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest identifier observed or issued so far.
    pub fn last(&self) -> RecordId {
        self.last
    }

    /// Make sure future identifiers stay above `id`.
    pub fn observe(&mut self, id: RecordId) {
        self.last = self.last.max(id);
    }

    /// Issue the next identifier given the current time.
    pub fn next_id(&mut self, now: Timestamp) -> RecordId {
        let id = now.max(self.last.saturating_add(1));
        self.last = id;
        id
    }
}
