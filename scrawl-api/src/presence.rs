use crate::{Time, UserId};

/// A writer counts as active this long after their last heartbeat. Both
/// the read-time recency filter and the backend's hygiene sweep cut at
/// this window.
pub const ACTIVE_WINDOW_SECS: i64 = 5 * 60;

/// One row of the active-writers table: who was last seen writing, and
/// when. Each client upserts its own row; everyone reads the whole set.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct WriterActivity {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub last_seen: Time,
}
