use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use crate::api::{Category, CategoryId, Change, Post, PostId, Profile, UserId};

/// The application-wide state a signed-in (or anonymous) session carries
/// around: who is viewing, and the cached post, profile and category
/// records shared across pages.
///
/// Per-view state (comment threads, reaction rows, the live feed) is
/// deliberately not in here: each view owns what it fetched, and the
/// backend stays the single arbiter of write conflicts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DbDump {
    pub viewer: Option<UserId>,
    pub profiles: Arc<HashMap<UserId, Profile>>,
    pub posts: Arc<HashMap<PostId, Arc<Post>>>,
    pub categories: Arc<HashMap<CategoryId, Category>>,
}

impl DbDump {
    /// The defined initial state: anonymous, nothing cached.
    pub fn anonymous() -> DbDump {
        DbDump {
            viewer: None,
            profiles: Arc::new(HashMap::new()),
            posts: Arc::new(HashMap::new()),
            categories: Arc::new(HashMap::new()),
        }
    }

    pub fn sign_in(&mut self, user: UserId) {
        self.viewer = Some(user);
    }

    /// Signing out also drops the derived caches.
    pub fn sign_out(&mut self) {
        *self = DbDump::anonymous();
    }

    pub fn add_profiles(&mut self, profiles: Vec<(UserId, Profile)>) {
        Arc::make_mut(&mut self.profiles).extend(profiles);
    }

    pub fn add_posts(&mut self, posts: Vec<Post>) {
        Arc::make_mut(&mut self.posts).extend(posts.into_iter().map(|p| (p.id, Arc::new(p))));
    }

    pub fn add_categories(&mut self, categories: Vec<Category>) {
        Arc::make_mut(&mut self.categories).extend(categories.into_iter().map(|c| (c.id, c)));
    }

    /// Folds one change-feed message into the post cache. Presence
    /// changes are not cached here; the roster re-fetches its snapshot.
    pub fn apply(&mut self, change: &Change) {
        match change {
            Change::PostInserted(post) => {
                Arc::make_mut(&mut self.posts).insert(post.id, Arc::new(post.clone()));
            }
            Change::PostUpdated { new, .. } => {
                Arc::make_mut(&mut self.posts).insert(new.id, Arc::new((**new).clone()));
            }
            Change::PresenceChanged => (),
        }
    }

    /// Published posts, newest first.
    pub fn published_posts(&self) -> Vec<Arc<Post>> {
        let mut posts: Vec<_> = self
            .posts
            .values()
            .filter(|p| p.published)
            .cloned()
            .collect();
        posts.sort_by_key(|p| (Reverse(p.created_at), p.id));
        posts
    }

    /// Everything one author wrote, drafts included, newest first. What
    /// the profile page shows for the author themselves.
    pub fn posts_by(&self, author: UserId) -> Vec<Arc<Post>> {
        let mut posts: Vec<_> = self
            .posts
            .values()
            .filter(|p| p.author_id == author)
            .cloned()
            .collect();
        posts.sort_by_key(|p| (Reverse(p.created_at), p.id));
        posts
    }

    pub fn post_by_slug(&self, slug: &str) -> Option<Arc<Post>> {
        self.posts.values().find(|p| p.slug == slug).cloned()
    }

    pub fn categories_sorted(&self) -> Vec<Category> {
        let mut categories: Vec<_> = self.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }
}
