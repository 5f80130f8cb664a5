use crate::api::{Time, UserId, WriterActivity, ACTIVE_WINDOW_SECS};

/// Each client re-sends its own heartbeat at this interval.
pub const HEARTBEAT_INTERVAL_SECS: i64 = 30;

/// How often a client asks the backend to sweep out stale rows. Storage
/// hygiene only: the read-time recency filter is what keeps the roster
/// correct.
pub const CLEANUP_INTERVAL_SECS: i64 = 120;

/// At most this many writers are shown; the rest become an overflow count.
pub const DISPLAY_LIMIT: usize = 6;

/// The set of currently-active writers, rebuilt from a full snapshot on
/// every refresh (the change feed only says "something changed").
///
/// Also tracks when this client last sent its own heartbeat and last
/// requested a cleanup sweep, so the view driving it knows when each is
/// due. As with the live feed, time only enters through arguments.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PresenceRoster {
    active: Vec<WriterActivity>,
    last_heartbeat: Option<Time>,
    last_cleanup: Option<Time>,
}

impl PresenceRoster {
    pub fn new() -> PresenceRoster {
        PresenceRoster::default()
    }

    /// Replaces the visible set with the snapshot rows whose heartbeat is
    /// within [`ACTIVE_WINDOW_SECS`] of the fetch time, most recently
    /// seen first.
    pub fn refresh(&mut self, snapshot: Vec<WriterActivity>, fetched_at: Time) {
        let cutoff = fetched_at - chrono::Duration::seconds(ACTIVE_WINDOW_SECS);
        self.active = snapshot
            .into_iter()
            .filter(|w| w.last_seen > cutoff)
            .collect();
        self.active
            .sort_by_key(|w| std::cmp::Reverse(w.last_seen));
    }

    pub fn active(&self) -> &[WriterActivity] {
        &self.active
    }

    pub fn is_active(&self, user: UserId) -> bool {
        self.active.iter().any(|w| w.user_id == user)
    }

    /// The writers to render, and how many more are active beyond the
    /// display limit.
    pub fn visible(&self) -> (&[WriterActivity], usize) {
        let shown = self.active.len().min(DISPLAY_LIMIT);
        (&self.active[..shown], self.active.len() - shown)
    }

    pub fn heartbeat_due(&self, now: Time) -> bool {
        match self.last_heartbeat {
            None => true,
            Some(at) => now - at >= chrono::Duration::seconds(HEARTBEAT_INTERVAL_SECS),
        }
    }

    pub fn note_heartbeat(&mut self, now: Time) {
        self.last_heartbeat = Some(now);
    }

    pub fn cleanup_due(&self, now: Time) -> bool {
        match self.last_cleanup {
            None => true,
            Some(at) => now - at >= chrono::Duration::seconds(CLEANUP_INTERVAL_SECS),
        }
    }

    pub fn note_cleanup(&mut self, now: Time) {
        self.last_cleanup = Some(now);
    }
}
