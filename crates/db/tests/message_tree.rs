//! Integration tests for the message forest: creation, root listings,
//! soft-delete tombstones, and cascade deletion.
//!
//! Exercises the repository layer against a real database to verify that:
//! - Roots and replies land in the same forum with the expected defaults
//! - Soft delete tombstones content in place and is idempotent
//! - Replies stay readable below a tombstoned parent
//! - Descendant collection is exhaustive at any depth
//! - The thread-view fetch is depth-bounded and skips deleted rows
//! - Concurrent edits are last-writer-wins (documented best-effort behavior)

use sqlx::PgPool;

use agora_core::messages::{ListOrder, TOMBSTONE_CONTENT};
use agora_core::types::DbId;
use agora_db::models::forum::CreateForum;
use agora_db::models::message::CreateMessage;
use agora_db::models::user::CreateUser;
use agora_db::repositories::{ForumRepo, MessageRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, username: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            avatar_url: None,
            is_admin: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_forum(pool: &PgPool, name: &str) -> DbId {
    ForumRepo::create(
        pool,
        &CreateForum {
            name: name.to_string(),
            description: None,
            visibility: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn post(
    pool: &PgPool,
    author_id: DbId,
    forum_id: DbId,
    parent_id: Option<DbId>,
    content: &str,
) -> DbId {
    MessageRepo::create(
        pool,
        author_id,
        &CreateMessage {
            content: content.to_string(),
            forum_id,
            parent_id,
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Test: creating a root message sets the expected defaults
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_root_message_defaults(pool: PgPool) {
    let author = seed_user(&pool, "alice").await;
    let forum = seed_forum(&pool, "General").await;

    let message = MessageRepo::create(
        &pool,
        author,
        &CreateMessage {
            content: "Hello".to_string(),
            forum_id: forum,
            parent_id: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(message.parent_id, None);
    assert_eq!(message.forum_id, forum);
    assert_eq!(message.author_id, author);
    assert!(!message.is_deleted);
    assert!(!message.is_edited);
    assert!(message.deleted_at.is_none());

    let roots = MessageRepo::list_roots(&pool, forum, ListOrder::Newest)
        .await
        .unwrap();
    assert!(
        roots.iter().any(|m| m.id == message.id),
        "new root should appear in the forum's root listing"
    );
}

// ---------------------------------------------------------------------------
// Test: root listing ordering, and exclusion of replies and deleted roots
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_roots_ordering_and_filters(pool: PgPool) {
    let author = seed_user(&pool, "alice").await;
    let forum = seed_forum(&pool, "General").await;

    let first = post(&pool, author, forum, None, "first").await;
    let second = post(&pool, author, forum, None, "second").await;
    let gone = post(&pool, author, forum, None, "gone").await;
    // A reply must never show up among roots.
    post(&pool, author, forum, Some(first), "a reply").await;

    MessageRepo::soft_delete(&pool, gone).await.unwrap();

    let newest = MessageRepo::list_roots(&pool, forum, ListOrder::Newest)
        .await
        .unwrap();
    let ids: Vec<DbId> = newest.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![second, first]);

    let oldest = MessageRepo::list_roots(&pool, forum, ListOrder::Oldest)
        .await
        .unwrap();
    let ids: Vec<DbId> = oldest.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![first, second]);
}

// ---------------------------------------------------------------------------
// Test: a reply lives in the same forum as its parent
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_reply_shares_forum_with_parent(pool: PgPool) {
    let author = seed_user(&pool, "alice").await;
    let forum = seed_forum(&pool, "General").await;

    let root = post(&pool, author, forum, None, "root").await;
    let reply = post(&pool, author, forum, Some(root), "reply").await;

    let reply_row = MessageRepo::find_by_id(&pool, reply).await.unwrap().unwrap();
    let parent_row = MessageRepo::find_by_id(&pool, reply_row.parent_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(parent_row.forum_id, reply_row.forum_id);
}

// ---------------------------------------------------------------------------
// Test: soft delete tombstones content in place
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_soft_delete_tombstones_content(pool: PgPool) {
    let author = seed_user(&pool, "alice").await;
    let forum = seed_forum(&pool, "General").await;
    let id = post(&pool, author, forum, None, "so long").await;

    let deleted = MessageRepo::soft_delete(&pool, id).await.unwrap();
    assert!(deleted, "first soft_delete should report a mutation");

    let row = MessageRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(row.is_deleted);
    assert!(row.deleted_at.is_some());
    assert_eq!(row.content, TOMBSTONE_CONTENT);
}

// ---------------------------------------------------------------------------
// Test: soft delete is idempotent -- the second call changes nothing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_soft_delete_idempotent(pool: PgPool) {
    let author = seed_user(&pool, "alice").await;
    let forum = seed_forum(&pool, "General").await;
    let id = post(&pool, author, forum, None, "delete me twice").await;

    assert!(MessageRepo::soft_delete(&pool, id).await.unwrap());
    let first = MessageRepo::find_by_id(&pool, id).await.unwrap().unwrap();

    let second_call = MessageRepo::soft_delete(&pool, id).await.unwrap();
    assert!(!second_call, "second soft_delete should be a no-op");

    let second = MessageRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(second.is_deleted);
    assert_eq!(second.content, TOMBSTONE_CONTENT);
    assert_eq!(
        second.deleted_at, first.deleted_at,
        "deleted_at must not move on repeat deletion"
    );
}

// ---------------------------------------------------------------------------
// Test: replies stay readable below a tombstoned parent
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_replies_readable_below_deleted_parent(pool: PgPool) {
    let author = seed_user(&pool, "alice").await;
    let forum = seed_forum(&pool, "General").await;

    let root = post(&pool, author, forum, None, "root").await;
    let reply = post(&pool, author, forum, Some(root), "Hi back").await;
    let nested = post(&pool, author, forum, Some(reply), "And again").await;

    // Plain delete on the root: no cascade.
    MessageRepo::soft_delete(&pool, root).await.unwrap();

    let root_row = MessageRepo::find_by_id(&pool, root).await.unwrap().unwrap();
    assert_eq!(root_row.content, TOMBSTONE_CONTENT);

    for (id, content) in [(reply, "Hi back"), (nested, "And again")] {
        let row = MessageRepo::find_by_id(&pool, id).await.unwrap().unwrap();
        assert!(!row.is_deleted, "descendants must be untouched");
        assert_eq!(row.content, content);
    }
    // The reply still references its tombstoned parent.
    let reply_row = MessageRepo::find_by_id(&pool, reply).await.unwrap().unwrap();
    assert_eq!(reply_row.parent_id, Some(root));
}

// ---------------------------------------------------------------------------
// Test: cascade collects and deletes the entire subtree
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_cascade_deletes_entire_subtree(pool: PgPool) {
    let author = seed_user(&pool, "alice").await;
    let forum = seed_forum(&pool, "General").await;

    // root <- a <- b, plus a sibling branch root <- c.
    let root = post(&pool, author, forum, None, "root").await;
    let a = post(&pool, author, forum, Some(root), "a").await;
    let b = post(&pool, author, forum, Some(a), "b").await;
    let c = post(&pool, author, forum, Some(root), "c").await;
    // An unrelated root must survive.
    let other = post(&pool, author, forum, None, "other").await;

    let mut descendants = MessageRepo::collect_descendant_ids(&pool, root)
        .await
        .unwrap();
    descendants.sort_unstable();
    assert_eq!(descendants, {
        let mut expected = vec![a, b, c];
        expected.sort_unstable();
        expected
    });

    let mut targets = descendants.clone();
    targets.push(root);
    let mutated = MessageRepo::soft_delete_many(&pool, &targets).await.unwrap();
    assert_eq!(mutated, 4, "root plus three descendants");

    for id in [root, a, b, c] {
        let row = MessageRepo::find_by_id(&pool, id).await.unwrap().unwrap();
        assert!(row.is_deleted, "message {id} should be tombstoned");
        assert_eq!(row.content, TOMBSTONE_CONTENT);
    }
    let survivor = MessageRepo::find_by_id(&pool, other).await.unwrap().unwrap();
    assert!(!survivor.is_deleted);
}

// ---------------------------------------------------------------------------
// Test: descendant collection traverses through already-deleted nodes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_collection_traverses_deleted_nodes(pool: PgPool) {
    let author = seed_user(&pool, "alice").await;
    let forum = seed_forum(&pool, "General").await;

    let root = post(&pool, author, forum, None, "root").await;
    let middle = post(&pool, author, forum, Some(root), "middle").await;
    let leaf = post(&pool, author, forum, Some(middle), "leaf").await;

    // Tombstone the middle node first; the leaf below it must still be found.
    MessageRepo::soft_delete(&pool, middle).await.unwrap();

    let mut descendants = MessageRepo::collect_descendant_ids(&pool, root)
        .await
        .unwrap();
    descendants.sort_unstable();
    let mut expected = vec![middle, leaf];
    expected.sort_unstable();
    assert_eq!(descendants, expected);
}

// ---------------------------------------------------------------------------
// Test: descendant collection has no depth cutoff
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_collection_is_exhaustive_at_depth(pool: PgPool) {
    let author = seed_user(&pool, "alice").await;
    let forum = seed_forum(&pool, "General").await;

    // A chain two levels deeper than the thread view's default bound.
    let root = post(&pool, author, forum, None, "root").await;
    let mut parent = root;
    let mut chain = Vec::new();
    for i in 0..7 {
        parent = post(&pool, author, forum, Some(parent), &format!("reply {i}")).await;
        chain.push(parent);
    }

    let descendants = MessageRepo::collect_descendant_ids(&pool, root)
        .await
        .unwrap();
    assert_eq!(descendants.len(), chain.len());

    let mut targets = descendants.clone();
    targets.push(root);
    let mutated = MessageRepo::soft_delete_many(&pool, &targets).await.unwrap();
    assert_eq!(mutated as usize, chain.len() + 1);

    let deepest = MessageRepo::find_by_id(&pool, *chain.last().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(deepest.is_deleted, "deepest reply must not escape the cascade");
}

// ---------------------------------------------------------------------------
// Test: the thread-view fetch is depth-bounded and skips deleted rows
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_subtree_depth_bound_and_filtering(pool: PgPool) {
    let author = seed_user(&pool, "alice").await;
    let forum = seed_forum(&pool, "General").await;

    let root = post(&pool, author, forum, None, "root").await;
    let mut parent = root;
    for i in 0..8 {
        parent = post(&pool, author, forum, Some(parent), &format!("reply {i}")).await;
    }

    let subtree = MessageRepo::list_subtree(&pool, root, 5).await.unwrap();
    assert_eq!(subtree.len(), 5, "one message per level up to the bound");

    // A deleted branch disappears from the view along with everything below.
    let branch = post(&pool, author, forum, Some(root), "branch").await;
    post(&pool, author, forum, Some(branch), "below branch").await;
    MessageRepo::soft_delete(&pool, branch).await.unwrap();

    let subtree = MessageRepo::list_subtree(&pool, root, 5).await.unwrap();
    assert!(
        subtree.iter().all(|m| m.id != branch),
        "deleted branch must be filtered"
    );
    assert!(
        subtree.iter().all(|m| m.parent_id != Some(branch)),
        "nothing below a deleted branch is reachable"
    );
}

// ---------------------------------------------------------------------------
// Test: edit marks the row and concurrent edits are last-writer-wins
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_edit_last_writer_wins(pool: PgPool) {
    let author = seed_user(&pool, "alice").await;
    let forum = seed_forum(&pool, "General").await;
    let id = post(&pool, author, forum, None, "original").await;

    let edited = MessageRepo::edit(&pool, id, "first edit").await.unwrap().unwrap();
    assert!(edited.is_edited);
    assert_eq!(edited.content, "first edit");

    // No version check guards the read-then-mutate window: a second writer
    // silently overwrites the first. This is the documented best-effort
    // behavior, not a bug being masked.
    let second = MessageRepo::edit(&pool, id, "second edit").await.unwrap().unwrap();
    assert_eq!(second.content, "second edit");

    let row = MessageRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.content, "second edit");
}

// ---------------------------------------------------------------------------
// Test: bulk soft delete skips rows already tombstoned
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_soft_delete_many_skips_already_deleted(pool: PgPool) {
    let author = seed_user(&pool, "alice").await;
    let forum = seed_forum(&pool, "General").await;

    let root = post(&pool, author, forum, None, "root").await;
    let a = post(&pool, author, forum, Some(root), "a").await;
    let b = post(&pool, author, forum, Some(root), "b").await;

    MessageRepo::soft_delete(&pool, a).await.unwrap();
    let first = MessageRepo::find_by_id(&pool, a).await.unwrap().unwrap();

    let mutated = MessageRepo::soft_delete_many(&pool, &[root, a, b]).await.unwrap();
    assert_eq!(mutated, 2, "only the rows not yet deleted count");

    let after = MessageRepo::find_by_id(&pool, a).await.unwrap().unwrap();
    assert_eq!(after.deleted_at, first.deleted_at);
}
