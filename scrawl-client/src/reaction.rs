use std::collections::{BTreeMap, BTreeSet};

use crate::api::{CommentReaction, PostReaction, ReactionType, UserId};

/// Aggregated reactions on one post, with the viewer's own pick.
///
/// A viewer holds at most one reaction per post: [`toggle`](Self::toggle)
/// on the held type removes it, on another type replaces it. The
/// transitions here are the viewer's perspective only; persisting them is
/// the backend's job, and views re-fetch after a write.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PostReactions {
    counts: BTreeMap<ReactionType, usize>,
    mine: Option<ReactionType>,
}

impl PostReactions {
    pub fn aggregate(reactions: &[PostReaction], viewer: Option<UserId>) -> PostReactions {
        let mut counts = BTreeMap::new();
        let mut mine = None;
        for r in reactions {
            *counts.entry(r.reaction).or_insert(0) += 1;
            if viewer == Some(r.user_id) {
                mine = Some(r.reaction);
            }
        }
        PostReactions { counts, mine }
    }

    pub fn count(&self, reaction: ReactionType) -> usize {
        self.counts.get(&reaction).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn mine(&self) -> Option<ReactionType> {
        self.mine
    }

    /// The `n` most-used reaction types, most used first.
    pub fn top(&self, n: usize) -> Vec<(ReactionType, usize)> {
        let mut all: Vec<_> = self.counts.iter().map(|(r, c)| (*r, *c)).collect();
        all.sort_by_key(|(r, c)| (std::cmp::Reverse(*c), *r));
        all.truncate(n);
        all
    }

    pub fn toggle(&mut self, reaction: ReactionType) {
        match self.mine {
            Some(held) if held == reaction => {
                decrement(&mut self.counts, held);
                self.mine = None;
            }
            Some(held) => {
                decrement(&mut self.counts, held);
                *self.counts.entry(reaction).or_insert(0) += 1;
                self.mine = Some(reaction);
            }
            None => {
                *self.counts.entry(reaction).or_insert(0) += 1;
                self.mine = Some(reaction);
            }
        }
    }
}

/// Aggregated reactions on one comment. Unlike posts, every type toggles
/// independently: the viewer may hold several types at once.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommentReactions {
    counts: BTreeMap<ReactionType, usize>,
    mine: BTreeSet<ReactionType>,
}

impl CommentReactions {
    pub fn aggregate(reactions: &[CommentReaction], viewer: Option<UserId>) -> CommentReactions {
        let mut counts = BTreeMap::new();
        let mut mine = BTreeSet::new();
        for r in reactions {
            *counts.entry(r.reaction).or_insert(0) += 1;
            if viewer == Some(r.user_id) {
                mine.insert(r.reaction);
            }
        }
        CommentReactions { counts, mine }
    }

    pub fn count(&self, reaction: ReactionType) -> usize {
        self.counts.get(&reaction).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn mine(&self) -> &BTreeSet<ReactionType> {
        &self.mine
    }

    pub fn toggle(&mut self, reaction: ReactionType) {
        if self.mine.remove(&reaction) {
            decrement(&mut self.counts, reaction);
        } else {
            self.mine.insert(reaction);
            *self.counts.entry(reaction).or_insert(0) += 1;
        }
    }
}

fn decrement(counts: &mut BTreeMap<ReactionType, usize>, reaction: ReactionType) {
    if let Some(c) = counts.get_mut(&reaction) {
        *c -= 1;
        if *c == 0 {
            counts.remove(&reaction);
        }
    }
}
