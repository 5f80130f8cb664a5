use anyhow::Context;

use crate::{
    CommentId, Db, Error, NewComment, NewPost, PostId, Profile, ReactionType,
};

/// A write submitted to the records backend. Validation happens before any
/// backend call; authorization is re-checked by the backend itself through
/// the [`Db`] lookups.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub enum Action {
    NewPost(NewPost),
    SetPublished { post: PostId, now_published: bool },
    NewComment(NewComment),
    DeleteComment(CommentId),
    TogglePostReaction { post: PostId, reaction: ReactionType },
    ToggleCommentReaction { comment: CommentId, reaction: ReactionType },
    UpdateProfile(Profile),
    Heartbeat,
}

impl Action {
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Action::NewPost(p) => p.validate(),
            Action::SetPublished { .. } => Ok(()),
            Action::NewComment(c) => c.validate(),
            Action::DeleteComment(_) => Ok(()),
            Action::TogglePostReaction { .. } => Ok(()),
            Action::ToggleCommentReaction { reaction, .. } => {
                match reaction.allowed_on_comments() {
                    true => Ok(()),
                    false => Err(Error::ReactionNotForComments(*reaction)),
                }
            }
            Action::UpdateProfile(p) => p.validate(),
            Action::Heartbeat => Ok(()),
        }
    }

    pub async fn is_authorized<D: Db>(&self, db: &mut D) -> anyhow::Result<bool> {
        let me = match db.current_user() {
            Some(me) => me,
            None => return Ok(false), // all writes require a signed-in user
        };
        Ok(match self {
            Action::NewPost(p) => p.author_id == me,
            Action::SetPublished { post, .. } => {
                let author = db
                    .post_author(*post)
                    .await
                    .with_context(|| format!("fetching author of post {post:?}"))?;
                author == me
            }
            Action::NewComment(c) => {
                if c.author_id != me {
                    return Ok(false);
                }
                match c.parent_id {
                    None => true,
                    // a reply must stay on the same post as its parent
                    Some(parent) => {
                        let parent_post = db
                            .comment_post(parent)
                            .await
                            .with_context(|| format!("fetching post of comment {parent:?}"))?;
                        parent_post == c.post_id
                    }
                }
            }
            Action::DeleteComment(c) => {
                let author = db
                    .comment_author(*c)
                    .await
                    .with_context(|| format!("fetching author of comment {c:?}"))?;
                author == me
            }
            Action::TogglePostReaction { .. } => true,
            Action::ToggleCommentReaction { .. } => true,
            Action::UpdateProfile(_) => true,
            Action::Heartbeat => true,
        })
    }
}
