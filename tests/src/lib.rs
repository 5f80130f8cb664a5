//! End-to-end tests: the client core driven against the mock backend
//! through the same contracts the hosted platform exposes.

#![cfg(test)]

use std::collections::HashMap;

use chrono::Utc;
use scrawl_api::{
    Action, AuthToken, Change, CommentId, Error, FeedMessage, NewComment, NewPost, NewSession,
    NewUser, PostId, Profile, ReactionType, UserId, Uuid,
};
use scrawl_client::{build_thread, displayed_count, DbDump, LiveFeed, PresenceRoster};
use scrawl_mock_server::MockServer;

fn create_user(server: &mut MockServer, name: &str) -> (UserId, AuthToken) {
    let id = UserId(Uuid::new_v4());
    server
        .admin_create_user(NewUser {
            id,
            name: name.to_string(),
            // the mock backend compares passwords to this directly
            initial_password_hash: format!("{name}-pass"),
        })
        .expect("creating user");
    let tok = server
        .auth(NewSession {
            user: name.to_string(),
            password: format!("{name}-pass"),
            device: "tests".to_string(),
            pow: String::new(),
        })
        .expect("authenticating");
    (id, tok)
}

fn new_post(author: UserId, title: &str, published: bool) -> NewPost {
    NewPost {
        id: PostId(Uuid::new_v4()),
        author_id: author,
        title: title.to_string(),
        content: lipsum::lipsum(40),
        excerpt: None,
        featured_image: None,
        published,
        categories: Vec::new(),
    }
}

fn new_comment(author: UserId, post: PostId, parent: Option<CommentId>, text: &str) -> NewComment {
    NewComment {
        id: CommentId(Uuid::new_v4()),
        post_id: post,
        author_id: author,
        parent_id: parent,
        content: text.to_string(),
    }
}

fn profile_map(server: &MockServer) -> HashMap<UserId, Profile> {
    server.fetch_profiles().into_iter().collect()
}

#[tokio::test]
async fn publishing_reaches_the_live_feed() {
    let mut server = MockServer::new();
    let (writer, writer_tok) = create_user(&mut server, "writer");
    let (_, reader_tok) = create_user(&mut server, "reader");

    let mut feed_rx = server.change_feed(reader_tok).expect("subscribing");
    let mut live = LiveFeed::new();
    let mut db = DbDump::anonymous();
    db.add_profiles(server.fetch_profiles());

    // a draft makes no noise
    let draft = new_post(writer, "draft in progress", false);
    let draft_id = draft.id;
    server
        .submit(writer_tok, Action::NewPost(draft))
        .await
        .expect("creating draft");
    assert!(feed_rx.try_recv().is_err());

    // publishing the draft is an update crossing unpublished -> published
    server
        .submit(
            writer_tok,
            Action::SetPublished {
                post: draft_id,
                now_published: true,
            },
        )
        .await
        .expect("publishing draft");
    let msg = feed_rx.try_recv().expect("publish event");
    let change = match msg {
        FeedMessage::Change(c) => c,
        FeedMessage::Pong => panic!("expected a change, got a pong"),
    };
    assert!(matches!(&change, Change::PostUpdated { old, new }
        if !old.published && new.published));

    let added = live.apply(&change, &db.profiles, Utc::now()).cloned();
    let added = added.expect("publish transition lands in the feed");
    assert_eq!(added.post_id, draft_id);
    assert_eq!(added.author.display_name, "writer");
    assert_eq!(live.unread(), 1);

    db.apply(&change);
    assert_eq!(db.published_posts().len(), 1);

    // a plain edit afterwards does not count again
    server
        .submit(
            writer_tok,
            Action::SetPublished {
                post: draft_id,
                now_published: true,
            },
        )
        .await
        .expect("re-publishing is a no-op edit");
    let msg = feed_rx.try_recv().expect("update event");
    if let FeedMessage::Change(c) = msg {
        assert!(live.apply(&c, &db.profiles, Utc::now()).is_none());
    }

    // seven straight publications, the feed keeps the last five
    for n in 0..7 {
        server
            .submit(
                writer_tok,
                Action::NewPost(new_post(writer, &format!("story {n}"), true)),
            )
            .await
            .expect("publishing");
        if let FeedMessage::Change(c) = feed_rx.try_recv().expect("insert event") {
            live.apply(&c, &db.profiles, Utc::now());
        }
    }
    assert_eq!(live.entries().len(), scrawl_client::FEED_CAPACITY);
    assert_eq!(live.entries()[0].title, "story 6");
    assert_eq!(live.entries()[4].title, "story 2");
}

#[tokio::test]
async fn comment_threads_survive_a_hard_delete() {
    let mut server = MockServer::new();
    let (alice, alice_tok) = create_user(&mut server, "alice");
    let (bob, bob_tok) = create_user(&mut server, "bob");

    let post = new_post(alice, "on threads", true);
    let post_id = post.id;
    server
        .submit(alice_tok, Action::NewPost(post))
        .await
        .expect("creating post");

    let top = new_comment(alice, post_id, None, "first!");
    let top_id = top.id;
    server
        .submit(alice_tok, Action::NewComment(top))
        .await
        .expect("top-level comment");
    let reply = new_comment(bob, post_id, Some(top_id), "replying");
    let reply_id = reply.id;
    server
        .submit(bob_tok, Action::NewComment(reply))
        .await
        .expect("reply");
    let other = new_comment(bob, post_id, None, lipsum::lipsum_title().as_str());
    server
        .submit(bob_tok, Action::NewComment(other))
        .await
        .expect("second top-level comment");

    server
        .submit(
            bob_tok,
            Action::ToggleCommentReaction {
                comment: top_id,
                reaction: ReactionType::Heart,
            },
        )
        .await
        .expect("reacting");

    // shuffle the fetched rows: the two-pass builder does not care
    let mut comments = server.fetch_comments(post_id).expect("fetching comments");
    use rand::seq::SliceRandom;
    comments.shuffle(&mut rand::thread_rng());

    let reactions = server
        .fetch_comment_reactions(post_id)
        .expect("fetching comment reactions");
    let profiles = profile_map(&server);
    let thread = build_thread(&comments, &reactions, &profiles);

    assert_eq!(displayed_count(&thread), 3);
    let top_node = thread
        .iter()
        .find(|n| n.comment.id == top_id)
        .expect("top comment in thread");
    assert_eq!(top_node.author.display_name, "alice");
    assert_eq!(top_node.replies.len(), 1);
    assert_eq!(top_node.replies[0].comment.id, reply_id);
    assert_eq!(top_node.reactions.len(), 1);

    // only the author may delete
    assert_eq!(
        server.submit(bob_tok, Action::DeleteComment(top_id)).await,
        Err(Error::PermissionDenied),
    );
    server
        .submit(alice_tok, Action::DeleteComment(top_id))
        .await
        .expect("deleting own comment");

    // the reply is now dangling and silently disappears from the view
    let comments = server.fetch_comments(post_id).expect("fetching comments");
    assert_eq!(comments.len(), 2); // the orphan row itself still exists
    let reactions = server
        .fetch_comment_reactions(post_id)
        .expect("fetching comment reactions");
    assert!(reactions.is_empty());
    let thread = build_thread(&comments, &reactions, &profiles);
    assert_eq!(displayed_count(&thread), 1);
    assert!(thread.iter().all(|n| n.comment.id != reply_id));
}

#[tokio::test]
async fn post_reactions_are_exclusive_per_user() {
    let mut server = MockServer::new();
    let (alice, alice_tok) = create_user(&mut server, "alice");
    let (_, bob_tok) = create_user(&mut server, "bob");

    let post = new_post(alice, "reactions", true);
    let post_id = post.id;
    server
        .submit(alice_tok, Action::NewPost(post))
        .await
        .expect("creating post");

    for (tok, reaction) in [
        (alice_tok, ReactionType::Like),
        (alice_tok, ReactionType::Heart), // replaces alice's like
        (bob_tok, ReactionType::Wow),
    ] {
        server
            .submit(
                tok,
                Action::TogglePostReaction {
                    post: post_id,
                    reaction,
                },
            )
            .await
            .expect("toggling");
    }

    let rows = server.fetch_post_reactions(post_id).expect("fetching");
    assert_eq!(rows.len(), 2);
    let mine: Vec<_> = rows
        .iter()
        .filter(|r| r.user_id == alice)
        .map(|r| r.reaction)
        .collect();
    assert_eq!(mine, vec![ReactionType::Heart]);

    let agg = scrawl_client::PostReactions::aggregate(&rows, Some(alice));
    assert_eq!(agg.total(), rows.len());
    assert_eq!(agg.mine(), Some(ReactionType::Heart));
    assert_eq!(agg.count(ReactionType::Like), 0);

    // toggling the held type off leaves only bob's
    server
        .submit(
            alice_tok,
            Action::TogglePostReaction {
                post: post_id,
                reaction: ReactionType::Heart,
            },
        )
        .await
        .expect("toggling off");
    assert_eq!(server.fetch_post_reactions(post_id).expect("fetching").len(), 1);
}

#[tokio::test]
async fn comment_reactions_stack_per_type() {
    let mut server = MockServer::new();
    let (alice, alice_tok) = create_user(&mut server, "alice");

    let post = new_post(alice, "multi reactions", true);
    let post_id = post.id;
    server
        .submit(alice_tok, Action::NewPost(post))
        .await
        .expect("creating post");
    let comment = new_comment(alice, post_id, None, "note to self");
    let comment_id = comment.id;
    server
        .submit(alice_tok, Action::NewComment(comment))
        .await
        .expect("commenting");

    for reaction in [ReactionType::Like, ReactionType::Heart] {
        server
            .submit(
                alice_tok,
                Action::ToggleCommentReaction {
                    comment: comment_id,
                    reaction,
                },
            )
            .await
            .expect("toggling");
    }
    let rows = server
        .fetch_comment_reactions(post_id)
        .expect("fetching comment reactions");
    let agg = scrawl_client::CommentReactions::aggregate(&rows, Some(alice));
    assert_eq!(
        agg.mine().iter().copied().collect::<Vec<_>>(),
        vec![ReactionType::Like, ReactionType::Heart],
    );

    // the post-only palette is rejected before any record is touched
    assert_eq!(
        server
            .submit(
                alice_tok,
                Action::ToggleCommentReaction {
                    comment: comment_id,
                    reaction: ReactionType::Wow,
                },
            )
            .await,
        Err(Error::ReactionNotForComments(ReactionType::Wow)),
    );
}

#[tokio::test]
async fn drafts_stay_visible_to_their_author_only() {
    let mut server = MockServer::new();
    let (alice, alice_tok) = create_user(&mut server, "alice");
    let (_, bob_tok) = create_user(&mut server, "bob");

    let rust = server
        .admin_create_category("Rust & Life")
        .expect("creating category");
    assert_eq!(rust.slug, "rust-life");
    server
        .admin_create_category("Web")
        .expect("creating category");

    let mut draft = new_post(alice, "unfinished thoughts", false);
    draft.categories = vec![rust.id];
    let draft_id = draft.id;
    server
        .submit(alice_tok, Action::NewPost(draft))
        .await
        .expect("creating draft");
    server
        .submit(alice_tok, Action::NewPost(new_post(alice, "done", true)))
        .await
        .expect("publishing");

    // the public listing and other sessions only see the published one
    assert_eq!(server.fetch_posts().len(), 1);
    assert_eq!(
        server
            .fetch_posts_by(bob_tok, alice)
            .expect("fetching as bob")
            .len(),
        1,
    );
    let own = server
        .fetch_posts_by(alice_tok, alice)
        .expect("fetching as alice");
    assert_eq!(own.len(), 2);
    assert_eq!(own[0].slug, "done");
    assert_eq!(own[1].slug, "unfinished-thoughts");

    assert_eq!(server.categories_of(draft_id), vec![rust.id]);
    let names: Vec<_> = server
        .fetch_categories()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Rust & Life", "Web"]);
    assert_eq!(server.categories_of(PostId(Uuid::new_v4())), Vec::new());
}

#[tokio::test]
async fn presence_flows_from_heartbeat_to_roster() {
    let mut server = MockServer::new();
    let (alice, alice_tok) = create_user(&mut server, "alice");
    let (_, bob_tok) = create_user(&mut server, "bob");

    let mut feed_rx = server.change_feed(bob_tok).expect("subscribing");
    let mut roster = PresenceRoster::new();

    let now = Utc::now();
    assert!(roster.heartbeat_due(now));
    server
        .submit(alice_tok, Action::Heartbeat)
        .await
        .expect("heartbeat");
    roster.note_heartbeat(now);
    assert!(!roster.heartbeat_due(now));

    // the change feed only says "something changed"; re-fetch the snapshot
    assert!(matches!(
        feed_rx.try_recv().expect("presence event"),
        FeedMessage::Change(Change::PresenceChanged),
    ));
    roster.refresh(server.fetch_active_writers(), Utc::now());
    assert!(roster.is_active(alice));
    let (shown, overflow) = roster.visible();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].display_name, "alice");
    assert_eq!(overflow, 0);

    // a fresh row survives the hygiene sweep
    server.cleanup_inactive_writers();
    roster.refresh(server.fetch_active_writers(), Utc::now());
    assert!(roster.is_active(alice));

    // profile rename shows up on the next heartbeat
    server
        .submit(
            alice_tok,
            Action::UpdateProfile(Profile {
                display_name: "Alice L.".to_string(),
                avatar_url: None,
            }),
        )
        .await
        .expect("renaming");
    server
        .submit(alice_tok, Action::Heartbeat)
        .await
        .expect("heartbeat");
    roster.refresh(server.fetch_active_writers(), Utc::now());
    assert_eq!(roster.active()[0].display_name, "Alice L.");
}

#[tokio::test]
async fn dropping_the_receiver_unsubscribes() {
    let mut server = MockServer::new();
    let (writer, writer_tok) = create_user(&mut server, "writer");

    let feed_rx = server.change_feed(writer_tok).expect("subscribing");
    drop(feed_rx);

    // relaying to the dropped channel prunes it instead of erroring
    server
        .submit(writer_tok, Action::NewPost(new_post(writer, "shout", true)))
        .await
        .expect("publishing after unsubscribe");

    // a new subscription starts from silence and still gets keepalives
    let mut feed_rx = server.change_feed(writer_tok).expect("re-subscribing");
    assert!(feed_rx.try_recv().is_err());
    server.ping();
    assert!(matches!(feed_rx.try_recv(), Ok(FeedMessage::Pong)));
}

#[test]
fn proof_of_work_gates_login() {
    let mut server = MockServer::new();
    create_user(&mut server, "alice");

    // a mangled pow is rejected before the password is even looked at
    assert_eq!(
        server.auth(NewSession {
            user: "alice".to_string(),
            password: "alice-pass".to_string(),
            device: "tests".to_string(),
            pow: "not a bcrypt hash".to_string(),
        }),
        Err(Error::InvalidPow),
    );

    // a real client computes the pow from the password
    let session = NewSession::new(
        "alice".to_string(),
        "alice-pass".to_string(),
        "tests".to_string(),
    );
    assert!(server.auth(session).is_ok());
}

#[tokio::test]
async fn failures_leave_state_untouched() {
    let mut server = MockServer::new();
    let (alice, alice_tok) = create_user(&mut server, "alice");

    // malformed input is rejected before any record changes
    let post = new_post(alice, "errors", true);
    let post_id = post.id;
    server
        .submit(alice_tok, Action::NewPost(post))
        .await
        .expect("creating post");
    assert_eq!(
        server
            .submit(
                alice_tok,
                Action::NewComment(new_comment(alice, post_id, None, "   ")),
            )
            .await,
        Err(Error::EmptyText),
    );
    assert!(server.fetch_comments(post_id).expect("fetching").is_empty());

    // unknown records surface as not-found
    let ghost = PostId(Uuid::new_v4());
    assert_eq!(server.fetch_post(ghost), Err(Error::NotFound(ghost.0)));

    // a bad password or a stale token never resolves
    assert_eq!(
        server.auth(NewSession {
            user: "alice".to_string(),
            password: "wrong".to_string(),
            device: "tests".to_string(),
            pow: String::new(),
        }),
        Err(Error::PermissionDenied),
    );
    assert_eq!(server.whoami(AuthToken::stub()), Err(Error::PermissionDenied));

    // signing out invalidates the session and clears the local dump
    let mut db = DbDump::anonymous();
    db.sign_in(alice);
    db.add_posts(server.fetch_posts());
    server.unauth(alice_tok).expect("signing out");
    assert_eq!(server.whoami(alice_tok), Err(Error::PermissionDenied));
    db.sign_out();
    assert_eq!(db, DbDump::anonymous());
}
