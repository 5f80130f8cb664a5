mod comment;
pub use comment::{build_thread, displayed_count, AuthorRef, CommentNode, ANONYMOUS};

mod db;
pub use db::DbDump;

mod feed;
pub use feed::{FeedEntry, LiveFeed, FEED_CAPACITY, UNREAD_DECAY_SECS};

mod presence;
pub use presence::{
    PresenceRoster, CLEANUP_INTERVAL_SECS, DISPLAY_LIMIT, HEARTBEAT_INTERVAL_SECS,
};

mod reaction;
pub use reaction::{CommentReactions, PostReactions};

pub mod api {
    pub use scrawl_api::*;
}
