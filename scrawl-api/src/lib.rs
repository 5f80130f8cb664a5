pub use uuid::{uuid, Uuid};

pub type Time = chrono::DateTime<chrono::Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

mod action;
pub use action::Action;

mod auth;
pub use auth::{AuthToken, NewSession, BCRYPT_POW_COST};

mod category;
pub use category::{Category, CategoryId};

mod comment;
pub use comment::{Comment, CommentId, NewComment};

mod db;
pub use db::Db;

mod error;
pub use error::Error;

mod event;
pub use event::{Change, FeedMessage};

mod post;
pub use post::{slugify, NewPost, Post, PostId};

mod presence;
pub use presence::{WriterActivity, ACTIVE_WINDOW_SECS};

mod reaction;
pub use reaction::{CommentReaction, PostReaction, ReactionId, ReactionType};

mod user;
pub use user::{NewUser, Profile, UserId};

/// Strings are stored and relayed as-is, except that a null byte would not
/// survive the backend round-trip and is rejected at the boundary.
pub fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(s.to_string()));
    }
    Ok(())
}

/// Body text for posts and comments must additionally be non-empty once
/// trimmed, so that no backend call is attempted for blank submissions.
pub fn validate_text(s: &str) -> Result<(), Error> {
    validate_string(s)?;
    if s.trim().is_empty() {
        return Err(Error::EmptyText);
    }
    Ok(())
}
