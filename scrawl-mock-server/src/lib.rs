//! In-memory stand-in for the hosted backend: records, identity and the
//! change feed, behind the same contracts the real platform offers. Used
//! by the integration tests to drive the client core end to end.

use std::collections::{btree_map, BTreeMap, HashMap};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use scrawl_client::api::{
    self, Action, AuthToken, Category, CategoryId, Change, Comment, CommentId, CommentReaction,
    Db, Error, FeedMessage, NewSession, NewUser, Post, PostId, PostReaction, Profile, ReactionId,
    UserId, Uuid, WriterActivity, ACTIVE_WINDOW_SECS,
};
use tokio::sync::mpsc;

pub struct MockServer {
    users: BTreeMap<UserId, DbUser>,
    profiles: HashMap<UserId, Profile>,

    posts: HashMap<PostId, Post>,
    post_categories: HashMap<PostId, Vec<CategoryId>>,
    categories: HashMap<CategoryId, Category>,

    comments: HashMap<CommentId, Comment>,
    post_reactions: Vec<PostReaction>,
    comment_reactions: Vec<CommentReaction>,

    writers: HashMap<UserId, WriterActivity>,

    feeds: Vec<mpsc::UnboundedSender<FeedMessage>>,
}

#[derive(Debug)]
struct DbUser {
    name: String,
    pass_hash: String,
    sessions: HashMap<AuthToken, Device>,
}

#[derive(Debug)]
struct Device(String);

/// [`Db`] lookups over the record tables, for [`Action::is_authorized`].
struct StoreView<'a> {
    me: UserId,
    posts: &'a HashMap<PostId, Post>,
    comments: &'a HashMap<CommentId, Comment>,
}

#[async_trait]
impl Db for StoreView<'_> {
    fn current_user(&self) -> Option<UserId> {
        Some(self.me)
    }

    async fn post_author(&mut self, p: PostId) -> anyhow::Result<UserId> {
        self.posts
            .get(&p)
            .map(|post| post.author_id)
            .ok_or_else(|| anyhow!("requested author of post {p:?} that is not in db"))
    }

    async fn comment_author(&mut self, c: CommentId) -> anyhow::Result<UserId> {
        self.comments
            .get(&c)
            .map(|comment| comment.author_id)
            .ok_or_else(|| anyhow!("requested author of comment {c:?} that is not in db"))
    }

    async fn comment_post(&mut self, c: CommentId) -> anyhow::Result<PostId> {
        self.comments
            .get(&c)
            .map(|comment| comment.post_id)
            .ok_or_else(|| anyhow!("requested post of comment {c:?} that is not in db"))
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            users: BTreeMap::new(),
            profiles: HashMap::new(),
            posts: HashMap::new(),
            post_categories: HashMap::new(),
            categories: HashMap::new(),
            comments: HashMap::new(),
            post_reactions: Vec::new(),
            comment_reactions: Vec::new(),
            writers: HashMap::new(),
            feeds: Vec::new(),
        }
    }

    pub fn admin_create_user(&mut self, u: NewUser) -> Result<(), Error> {
        u.validate()?;

        if self.users.values().any(|db| db.name == u.name) {
            return Err(Error::NameAlreadyUsed(u.name));
        }

        match self.users.entry(u.id) {
            btree_map::Entry::Occupied(_) => Err(Error::UuidAlreadyUsed(u.id.0)),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(DbUser {
                    name: u.name.clone(),
                    pass_hash: u.initial_password_hash,
                    sessions: HashMap::new(),
                });
                self.profiles.insert(
                    u.id,
                    Profile {
                        display_name: u.name,
                        avatar_url: None,
                    },
                );
                Ok(())
            }
        }
    }

    pub fn admin_create_category(&mut self, name: &str) -> Result<Category, Error> {
        api::validate_text(name)?;
        let category = Category {
            id: CategoryId(Uuid::new_v4()),
            name: name.to_string(),
            slug: api::slugify(name),
            color: None,
        };
        self.categories.insert(category.id, category.clone());
        Ok(category)
    }

    pub fn auth(&mut self, s: NewSession) -> Result<AuthToken, Error> {
        s.validate_except_pow()?;
        // the empty pow is let through so fixtures can skip the bcrypt work
        if !s.pow.is_empty() && !s.verify_pow() {
            return Err(Error::InvalidPow);
        }
        for (_, u) in self.users.iter_mut() {
            if u.name == s.user {
                // tests don't actually run bcrypt, the password doubles as its hash
                if s.password != u.pass_hash {
                    return Err(Error::PermissionDenied);
                }
                let tok = AuthToken(Uuid::new_v4());
                u.sessions.insert(tok, Device(s.device));
                return Ok(tok);
            }
        }
        Err(Error::PermissionDenied)
    }

    fn resolve(&self, tok: AuthToken) -> Result<UserId, Error> {
        for (id, u) in self.users.iter() {
            if u.sessions.contains_key(&tok) {
                return Ok(*id);
            }
        }
        Err(Error::PermissionDenied)
    }

    pub fn unauth(&mut self, tok: AuthToken) -> Result<(), Error> {
        let id = self.resolve(tok)?;
        self.users
            .get_mut(&id)
            .expect("resolved token for user that is not in db")
            .sessions
            .remove(&tok);
        Ok(())
    }

    pub fn whoami(&self, tok: AuthToken) -> Result<UserId, Error> {
        self.resolve(tok)
    }

    /// Profiles are public records: readable without a session, like the
    /// published posts themselves.
    pub fn fetch_profiles(&self) -> Vec<(UserId, Profile)> {
        self.profiles.iter().map(|(id, p)| (*id, p.clone())).collect()
    }

    /// Published posts, newest first. What the home page fetches.
    pub fn fetch_posts(&self) -> Vec<Post> {
        let mut posts: Vec<_> = self.posts.values().filter(|p| p.published).cloned().collect();
        posts.sort_by_key(|p| (std::cmp::Reverse(p.created_at), p.id));
        posts
    }

    /// All of one author's posts, drafts included, newest first.
    pub fn fetch_posts_by(&self, tok: AuthToken, author: UserId) -> Result<Vec<Post>, Error> {
        let me = self.resolve(tok)?;
        let mut posts: Vec<_> = self
            .posts
            .values()
            .filter(|p| p.author_id == author && (p.published || me == author))
            .cloned()
            .collect();
        posts.sort_by_key(|p| (std::cmp::Reverse(p.created_at), p.id));
        Ok(posts)
    }

    pub fn fetch_post(&self, post: PostId) -> Result<Post, Error> {
        self.posts.get(&post).cloned().ok_or(Error::NotFound(post.0))
    }

    pub fn fetch_categories(&self) -> Vec<Category> {
        let mut categories: Vec<_> = self.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    pub fn categories_of(&self, post: PostId) -> Vec<CategoryId> {
        self.post_categories.get(&post).cloned().unwrap_or_default()
    }

    /// Comments of one post in ascending creation order, the order the
    /// tree builder expects.
    pub fn fetch_comments(&self, post: PostId) -> Result<Vec<Comment>, Error> {
        if !self.posts.contains_key(&post) {
            return Err(Error::NotFound(post.0));
        }
        let mut comments: Vec<_> = self
            .comments
            .values()
            .filter(|c| c.post_id == post)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }

    pub fn fetch_comment_reactions(&self, post: PostId) -> Result<Vec<CommentReaction>, Error> {
        if !self.posts.contains_key(&post) {
            return Err(Error::NotFound(post.0));
        }
        Ok(self
            .comment_reactions
            .iter()
            .filter(|r| {
                self.comments
                    .get(&r.comment_id)
                    .map(|c| c.post_id == post)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    pub fn fetch_post_reactions(&self, post: PostId) -> Result<Vec<PostReaction>, Error> {
        if !self.posts.contains_key(&post) {
            return Err(Error::NotFound(post.0));
        }
        Ok(self
            .post_reactions
            .iter()
            .filter(|r| r.post_id == post)
            .cloned()
            .collect())
    }

    /// The raw active-writers snapshot, newest heartbeat first. Recency
    /// filtering is the reader's job.
    pub fn fetch_active_writers(&self) -> Vec<WriterActivity> {
        let mut writers: Vec<_> = self.writers.values().cloned().collect();
        writers.sort_by_key(|w| std::cmp::Reverse(w.last_seen));
        writers
    }

    /// Drops presence rows older than the active window. Storage hygiene
    /// requested by clients on a timer; reads stay correct without it.
    pub fn cleanup_inactive_writers(&mut self) {
        let cutoff = Utc::now() - chrono::Duration::seconds(ACTIVE_WINDOW_SECS);
        let before = self.writers.len();
        self.writers.retain(|_, w| w.last_seen > cutoff);
        if self.writers.len() != before {
            self.relay(Change::PresenceChanged);
        }
    }

    /// Subscribes to the change feed. Dropping the receiver unsubscribes:
    /// the sender is pruned on the next relay, and nothing is ever
    /// delivered after that.
    pub fn change_feed(&mut self, tok: AuthToken) -> Result<mpsc::UnboundedReceiver<FeedMessage>, Error> {
        self.resolve(tok)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        self.feeds.push(sender);
        Ok(receiver)
    }

    /// Keepalive probe on the change feed.
    pub fn ping(&mut self) {
        self.feeds.retain(|f| f.send(FeedMessage::Pong).is_ok());
    }

    fn relay(&mut self, c: Change) {
        self.feeds
            .retain(|f| f.send(FeedMessage::Change(c.clone())).is_ok());
    }

    pub async fn submit(&mut self, tok: AuthToken, a: Action) -> Result<(), Error> {
        let me = self.resolve(tok)?;
        a.validate()?;

        // existence of the targeted records, before ownership
        match &a {
            Action::SetPublished { post, .. } | Action::TogglePostReaction { post, .. } => {
                if !self.posts.contains_key(post) {
                    return Err(Error::NotFound(post.0));
                }
            }
            Action::NewComment(c) => {
                if !self.posts.contains_key(&c.post_id) {
                    return Err(Error::NotFound(c.post_id.0));
                }
                if let Some(parent) = c.parent_id {
                    if !self.comments.contains_key(&parent) {
                        return Err(Error::NotFound(parent.0));
                    }
                }
            }
            Action::DeleteComment(c) | Action::ToggleCommentReaction { comment: c, .. } => {
                if !self.comments.contains_key(c) {
                    return Err(Error::NotFound(c.0));
                }
            }
            _ => (),
        }

        let mut view = StoreView {
            me,
            posts: &self.posts,
            comments: &self.comments,
        };
        match a.is_authorized(&mut view).await {
            Ok(true) => (),
            Ok(false) => return Err(Error::PermissionDenied),
            Err(e) => return Err(Error::Unknown(format!("{e:#}"))),
        }

        let now = Utc::now();
        match a {
            Action::NewPost(p) => {
                if self.posts.contains_key(&p.id) {
                    return Err(Error::UuidAlreadyUsed(p.id.0));
                }
                let categories = p.categories.clone();
                let post = p.into_post(now);
                self.post_categories.insert(post.id, categories);
                self.posts.insert(post.id, post.clone());
                if post.published {
                    self.relay(Change::PostInserted(post));
                }
            }
            Action::SetPublished { post, now_published } => {
                let p = self.posts.get_mut(&post).expect("checked above");
                let old = p.clone();
                p.published = now_published;
                if now_published && p.published_at.is_none() {
                    p.published_at = Some(now);
                }
                p.updated_at = now;
                let new = p.clone();
                self.relay(Change::PostUpdated {
                    old: Box::new(old),
                    new: Box::new(new),
                });
            }
            Action::NewComment(c) => {
                if self.comments.contains_key(&c.id) {
                    return Err(Error::UuidAlreadyUsed(c.id.0));
                }
                let comment = c.into_comment(now);
                self.comments.insert(comment.id, comment);
            }
            Action::DeleteComment(c) => {
                // hard delete; replies are left behind as orphans for the
                // thread builder to exclude
                self.comments.remove(&c);
                self.comment_reactions.retain(|r| r.comment_id != c);
            }
            Action::TogglePostReaction { post, reaction } => {
                let held = self
                    .post_reactions
                    .iter()
                    .position(|r| r.post_id == post && r.user_id == me);
                match held {
                    Some(i) if self.post_reactions[i].reaction == reaction => {
                        self.post_reactions.swap_remove(i);
                    }
                    held => {
                        // one reaction per (user, post): replace, not stack
                        if let Some(i) = held {
                            self.post_reactions.swap_remove(i);
                        }
                        self.post_reactions.push(PostReaction {
                            id: ReactionId(Uuid::new_v4()),
                            post_id: post,
                            user_id: me,
                            reaction,
                        });
                    }
                }
            }
            Action::ToggleCommentReaction { comment, reaction } => {
                let held = self.comment_reactions.iter().position(|r| {
                    r.comment_id == comment && r.user_id == me && r.reaction == reaction
                });
                match held {
                    Some(i) => {
                        self.comment_reactions.swap_remove(i);
                    }
                    None => self.comment_reactions.push(CommentReaction {
                        comment_id: comment,
                        user_id: me,
                        reaction,
                    }),
                }
            }
            Action::UpdateProfile(p) => {
                self.profiles.insert(me, p);
            }
            Action::Heartbeat => {
                let profile = self
                    .profiles
                    .get(&me)
                    .cloned()
                    .ok_or(Error::NotFound(me.0))?;
                self.writers.insert(
                    me,
                    WriterActivity {
                        user_id: me,
                        display_name: profile.display_name,
                        avatar_url: profile.avatar_url,
                        last_seen: now,
                    },
                );
                self.relay(Change::PresenceChanged);
            }
        }
        Ok(())
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}
