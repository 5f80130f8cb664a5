use crate::Post;

/// One message on the change feed. Within one subscription the messages
/// arrive in the order the backend emitted them; nothing is delivered
/// after the subscription is dropped.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub enum FeedMessage {
    Pong,
    Change(Change),
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub enum Change {
    PostInserted(Post),

    /// Update events carry the before/after pair, so consumers can tell a
    /// publish transition apart from a plain edit.
    PostUpdated { old: Box<Post>, new: Box<Post> },

    /// The active-writers table changed in some way; consumers re-fetch
    /// the roster snapshot rather than patching it incrementally.
    PresenceChanged,
}
