use uuid::Uuid;

use crate::{CommentId, PostId, UserId, STUB_UUID};

/// The fixed palette of reactions. Posts accept all six; comments only
/// accept the first three.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    Like,
    Heart,
    Laugh,
    Wow,
    Sad,
    Angry,
}

impl ReactionType {
    pub const ON_POSTS: [ReactionType; 6] = [
        ReactionType::Like,
        ReactionType::Heart,
        ReactionType::Laugh,
        ReactionType::Wow,
        ReactionType::Sad,
        ReactionType::Angry,
    ];

    pub const ON_COMMENTS: [ReactionType; 3] =
        [ReactionType::Like, ReactionType::Heart, ReactionType::Laugh];

    pub fn allowed_on_comments(self) -> bool {
        Self::ON_COMMENTS.contains(&self)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ReactionId(pub Uuid);

impl ReactionId {
    pub fn stub() -> ReactionId {
        ReactionId(STUB_UUID)
    }
}

/// A user's sentiment on a post. The backend keeps at most one row per
/// (user, post); picking another type replaces the previous row.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PostReaction {
    pub id: ReactionId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub reaction: ReactionType,
}

/// A user's sentiment on a comment. Toggled per type: one user may hold
/// several rows of different types for the same comment.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentReaction {
    pub comment_id: CommentId,
    pub user_id: UserId,
    pub reaction: ReactionType,
}
