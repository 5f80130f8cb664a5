use std::collections::HashMap;

use crate::api::{Change, Post, PostId, Profile, Time, UserId};
use crate::AuthorRef;

/// How many recent publications the live feed retains.
pub const FEED_CAPACITY: usize = 5;

/// The unread badge clears this long after the last increment.
pub const UNREAD_DECAY_SECS: i64 = 10;

/// What the live feed keeps about one freshly published post.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeedEntry {
    pub post_id: PostId,
    pub title: String,
    pub author: AuthorRef,
    pub created_at: Time,
}

/// The bounded most-recent-first list of publish events, fed from the
/// change stream of one subscription.
///
/// Entries are ordered by arrival, not by the post's own timestamps: an
/// out-of-order event still lands at the front. The unread counter decays
/// on a restart-on-increment policy: every increment pushes the single
/// decay deadline [`UNREAD_DECAY_SECS`] into the future, and
/// [`expire_unread`](Self::expire_unread) only clears once that latest
/// deadline has passed.
///
/// Time comes in through arguments; the value owns no timer and no
/// subscription, so tearing a view down is dropping the `LiveFeed`
/// together with its feed receiver.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LiveFeed {
    entries: Vec<FeedEntry>,
    unread: usize,
    unread_deadline: Option<Time>,
}

impl LiveFeed {
    pub fn new() -> LiveFeed {
        LiveFeed::default()
    }

    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    pub fn unread(&self) -> usize {
        self.unread
    }

    /// When the unread badge should next be re-checked, if it is showing.
    pub fn unread_deadline(&self) -> Option<Time> {
        self.unread_deadline
    }

    /// Ingests one change-feed message. Returns the entry it prepended if
    /// the change was a publication, for surfacing a notification.
    ///
    /// Only actual publications count: an insert of an already-published
    /// post, or an update whose before/after pair crosses from
    /// unpublished to published. Plain edits and presence changes are
    /// ignored.
    pub fn apply(
        &mut self,
        change: &Change,
        profiles: &HashMap<UserId, Profile>,
        now: Time,
    ) -> Option<&FeedEntry> {
        let post = match change {
            Change::PostInserted(post) if post.published => post,
            Change::PostUpdated { old, new } if !old.published && new.published => new,
            _ => return None,
        };
        self.push(post, profiles, now);
        self.entries.first()
    }

    fn push(&mut self, post: &Post, profiles: &HashMap<UserId, Profile>, now: Time) {
        self.entries.insert(
            0,
            FeedEntry {
                post_id: post.id,
                title: post.title.clone(),
                author: AuthorRef::lookup(profiles, post.author_id),
                created_at: post.created_at,
            },
        );
        self.entries.truncate(FEED_CAPACITY);
        self.unread += 1;
        self.unread_deadline = Some(now + chrono::Duration::seconds(UNREAD_DECAY_SECS));
    }

    /// Clears the unread badge if the latest decay deadline has passed.
    /// Called when a decay timer fires; harmless to call more often.
    pub fn expire_unread(&mut self, now: Time) {
        if let Some(deadline) = self.unread_deadline {
            if now >= deadline {
                self.unread = 0;
                self.unread_deadline = None;
            }
        }
    }
}
