use std::collections::{HashMap, HashSet};

use crate::api::{Comment, CommentId, CommentReaction, Profile, UserId};

/// Display name used when an author has no profile record.
pub const ANONYMOUS: &str = "Anonymous";

/// Author display data joined into a node by user id; read-only here.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuthorRef {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl AuthorRef {
    pub fn lookup(profiles: &HashMap<UserId, Profile>, author: UserId) -> AuthorRef {
        match profiles.get(&author) {
            Some(p) => AuthorRef {
                display_name: p.display_name.clone(),
                avatar_url: p.avatar_url.clone(),
            },
            None => AuthorRef {
                display_name: ANONYMOUS.to_string(),
                avatar_url: None,
            },
        }
    }
}

/// One comment ready for display: record, author, its reaction rows, and
/// (for top-level comments only) the direct replies. Reply nodes keep
/// `replies` empty: threads render exactly one level deep.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentNode {
    pub comment: Comment,
    pub author: AuthorRef,
    pub reactions: Vec<CommentReaction>,
    pub replies: Vec<CommentNode>,
}

/// Builds the ordered comment forest for one post out of the flat record
/// sets the backend returns.
///
/// Two passes: first index every comment id, then link replies to their
/// parents, so the result does not depend on input order. A reply whose
/// parent id resolves to nothing in the working set (dangling reference,
/// self-reference, or a true cycle) is silently excluded rather than
/// surfaced at top level.
pub fn build_thread(
    comments: &[Comment],
    reactions: &[CommentReaction],
    profiles: &HashMap<UserId, Profile>,
) -> Vec<CommentNode> {
    let mut comments: Vec<&Comment> = comments.iter().collect();
    comments.sort_by_key(|c| (c.created_at, c.id));

    // first pass: every id we know about
    let known: HashSet<CommentId> = comments.iter().map(|c| c.id).collect();

    // second pass: partition into top-level nodes and per-parent reply lists,
    // both in ascending creation order
    let mut top_level: Vec<CommentNode> = Vec::new();
    let mut replies: HashMap<CommentId, Vec<CommentNode>> = HashMap::new();
    for c in comments {
        let node = CommentNode {
            author: AuthorRef::lookup(profiles, c.author_id),
            reactions: reactions
                .iter()
                .filter(|r| r.comment_id == c.id)
                .cloned()
                .collect(),
            replies: Vec::new(),
            comment: c.clone(),
        };
        match c.parent_id {
            None => top_level.push(node),
            Some(parent) if parent == c.id => {
                tracing::warn!(comment = ?c.id, "comment is its own parent, dropping it");
            }
            Some(parent) if known.contains(&parent) => {
                replies.entry(parent).or_default().push(node);
            }
            Some(parent) => {
                tracing::warn!(
                    comment = ?c.id,
                    ?parent,
                    "comment replies to an unknown parent, dropping it"
                );
            }
        }
    }

    // replies keyed by a non-top-level comment stay unattached here: a
    // reply-to-a-reply is neither rendered nor counted
    for node in &mut top_level {
        if let Some(r) = replies.remove(&node.comment.id) {
            node.replies = r;
        }
    }
    top_level
}

/// The comment count shown next to the thread: top-level comments plus
/// their direct replies.
pub fn displayed_count(thread: &[CommentNode]) -> usize {
    thread.len() + thread.iter().map(|n| n.replies.len()).sum::<usize>()
}
