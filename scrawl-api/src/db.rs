use async_trait::async_trait;

use crate::{CommentId, PostId, UserId};

/// Lookups an [`Action`](crate::Action) needs to decide whether the
/// current user may submit it. Implemented by whatever holds the records:
/// the backend on the write path, or a client-side cache for button
/// visibility.
#[async_trait]
pub trait Db {
    fn current_user(&self) -> Option<UserId>;
    async fn post_author(&mut self, p: PostId) -> anyhow::Result<UserId>;
    async fn comment_author(&mut self, c: CommentId) -> anyhow::Result<UserId>;
    async fn comment_post(&mut self, c: CommentId) -> anyhow::Result<PostId>;
}
