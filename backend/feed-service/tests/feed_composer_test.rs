//! Feed composition against an in-memory content graph.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use feed_service::db::ContentStore;
use feed_service::error::{AppError, Result};
use feed_service::models::{
    CursorPos, FeedContent, FeedItemRow, FeedItemType, FeedScope, PostRow, RankingListRow,
    ResolvedRef, Sentiment, UserRow,
};
use feed_service::services::{CredentialIssuer, FeedComposer, MediaBroker};

/// Content graph held in maps, ordered the way the store orders it.
#[derive(Default)]
struct MemStore {
    feed_items: Vec<FeedItemRow>,
    users: HashMap<Uuid, UserRow>,
    posts: HashMap<Uuid, PostRow>,
    lists: HashMap<Uuid, RankingListRow>,
    follows: Vec<(Uuid, Uuid)>,
    fail: AtomicBool,
}

impl MemStore {
    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Database("connection reset".to_string()));
        }
        Ok(())
    }

    fn in_scope(&self, scope: &FeedScope, row: &FeedItemRow) -> bool {
        match scope {
            FeedScope::Home { viewer } => self
                .follows
                .iter()
                .any(|(follower, followee)| follower == viewer && *followee == row.user_id),
            FeedScope::Profile { user } => row.user_id == *user,
        }
    }
}

#[async_trait]
impl ContentStore for MemStore {
    async fn feed_page(
        &self,
        scope: &FeedScope,
        after: Option<&CursorPos>,
        limit: i64,
    ) -> Result<Vec<FeedItemRow>> {
        self.check()?;
        let mut rows: Vec<FeedItemRow> = self
            .feed_items
            .iter()
            .filter(|row| self.in_scope(scope, row))
            .filter(|row| match after {
                Some(pos) => (row.created_at, row.id) < (pos.created_at, pos.id),
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn cursor_position(&self, id: Uuid) -> Result<Option<CursorPos>> {
        self.check()?;
        Ok(self
            .feed_items
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.cursor_pos()))
    }

    async fn feed_item(&self, id: Uuid) -> Result<Option<FeedItemRow>> {
        self.check()?;
        Ok(self.feed_items.iter().find(|row| row.id == id).cloned())
    }

    async fn user(&self, id: Uuid) -> Result<Option<UserRow>> {
        self.check()?;
        Ok(self.users.get(&id).cloned())
    }

    async fn post(&self, id: Uuid) -> Result<Option<PostRow>> {
        self.check()?;
        Ok(self.posts.get(&id).cloned())
    }

    async fn ranking_list(&self, id: Uuid) -> Result<Option<RankingListRow>> {
        self.check()?;
        Ok(self.lists.get(&id).cloned())
    }
}

struct EchoIssuer;

#[async_trait]
impl CredentialIssuer for EchoIssuer {
    async fn issue(&self, object_key: &str, ttl_seconds: u32) -> Result<String> {
        Ok(format!("https://cdn.test/{object_key}?ttl={ttl_seconds}"))
    }
}

fn ts(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap() + Duration::seconds(offset_secs)
}

fn user(store: &mut MemStore, username: &str) -> Uuid {
    let id = Uuid::new_v4();
    store.users.insert(
        id,
        UserRow {
            id,
            username: username.to_string(),
            name: username.to_string(),
            avatar_key: None,
        },
    );
    id
}

fn post_item(store: &mut MemStore, author: Uuid, content: &str, at: DateTime<Utc>) -> Uuid {
    let post_id = Uuid::new_v4();
    store.posts.insert(
        post_id,
        PostRow {
            id: post_id,
            author_id: author,
            content: content.to_string(),
            image_key: None,
            created_at: at,
        },
    );
    let item_id = Uuid::new_v4();
    store.feed_items.push(FeedItemRow {
        id: item_id,
        user_id: author,
        item_type: FeedItemType::Post,
        created_at: at,
        post_id: Some(post_id),
        ranking_list_id: None,
        retweet_of_id: None,
        quoted_item_id: None,
        quote_text: None,
    });
    item_id
}

fn composer(store: Arc<MemStore>) -> FeedComposer {
    let broker = MediaBroker::new(Arc::new(EchoIssuer), 86400, 300);
    FeedComposer::new(store, Arc::new(broker))
}

#[tokio::test]
async fn pages_concatenate_without_gaps_or_duplicates() {
    let mut store = MemStore::default();
    let author = user(&mut store, "ana");
    let viewer = user(&mut store, "viewer");
    store.follows.push((viewer, author));
    for i in 0..5 {
        post_item(&mut store, author, &format!("post {i}"), ts(i));
    }
    let composer = composer(Arc::new(store));
    let scope = FeedScope::Home { viewer };

    let mut cursor = None;
    let mut seen = Vec::new();
    loop {
        let page = composer.fetch_feed(scope, cursor, 2).await.unwrap();
        seen.extend(page.items.iter().map(|v| v.id));
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    let whole = composer.fetch_feed(scope, None, 50).await.unwrap();
    let expected: Vec<Uuid> = whole.items.iter().map(|v| v.id).collect();
    assert_eq!(seen, expected);
    assert_eq!(seen.len(), 5);
}

#[tokio::test]
async fn replaying_a_cursor_returns_the_identical_page() {
    let mut store = MemStore::default();
    let author = user(&mut store, "ana");
    for i in 0..6 {
        post_item(&mut store, author, &format!("post {i}"), ts(i));
    }
    let composer = composer(Arc::new(store));
    let scope = FeedScope::Profile { user: author };

    let first = composer.fetch_feed(scope, None, 3).await.unwrap();
    let cursor = first.next_cursor;

    let second_a = composer.fetch_feed(scope, cursor, 3).await.unwrap();
    let second_b = composer.fetch_feed(scope, cursor, 3).await.unwrap();

    let ids_a: Vec<Uuid> = second_a.items.iter().map(|v| v.id).collect();
    let ids_b: Vec<Uuid> = second_b.items.iter().map(|v| v.id).collect();
    assert_eq!(ids_a, ids_b);
    assert_eq!(second_a.next_cursor, second_b.next_cursor);
}

#[tokio::test]
async fn exhaustion_is_signalled_only_when_fewer_than_limit_plus_one_remain() {
    let mut store = MemStore::default();
    let author = user(&mut store, "ana");
    let items: Vec<Uuid> = (0..3)
        .map(|i| post_item(&mut store, author, &format!("post {i}"), ts(i)))
        .collect();
    let composer = composer(Arc::new(store));
    let scope = FeedScope::Profile { user: author };

    // Newest first: items[2], items[1] on page one, items[0] on page two.
    let page1 = composer.fetch_feed(scope, None, 2).await.unwrap();
    assert_eq!(page1.items.len(), 2);
    assert_eq!(page1.next_cursor, Some(items[1]));

    let page2 = composer.fetch_feed(scope, page1.next_cursor, 2).await.unwrap();
    assert_eq!(page2.items.len(), 1);
    assert_eq!(page2.items[0].id, items[0]);
    assert_eq!(page2.next_cursor, None);
}

#[tokio::test]
async fn empty_audience_yields_an_empty_page() {
    let mut store = MemStore::default();
    let viewer = user(&mut store, "loner");
    let composer = composer(Arc::new(store));

    let page = composer
        .fetch_feed(FeedScope::Home { viewer }, None, 20)
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.next_cursor, None);
}

#[tokio::test]
async fn unknown_cursor_is_rejected() {
    let mut store = MemStore::default();
    let author = user(&mut store, "ana");
    post_item(&mut store, author, "hello", ts(0));
    let composer = composer(Arc::new(store));

    let err = composer
        .fetch_feed(FeedScope::Profile { user: author }, Some(Uuid::new_v4()), 10)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn quote_of_deleted_content_resolves_to_a_tombstone() {
    let mut store = MemStore::default();
    let author = user(&mut store, "ana");
    let quoter = user(&mut store, "bob");

    // Ranking update whose backing list no longer exists.
    let dangling = Uuid::new_v4();
    store.feed_items.push(FeedItemRow {
        id: dangling,
        user_id: author,
        item_type: FeedItemType::RankingUpdate,
        created_at: ts(0),
        post_id: None,
        ranking_list_id: Some(Uuid::new_v4()),
        retweet_of_id: None,
        quoted_item_id: None,
        quote_text: None,
    });
    store.feed_items.push(FeedItemRow {
        id: Uuid::new_v4(),
        user_id: quoter,
        item_type: FeedItemType::QuoteRetweet,
        created_at: ts(10),
        post_id: None,
        ranking_list_id: None,
        retweet_of_id: None,
        quoted_item_id: Some(dangling),
        quote_text: Some("look at this".to_string()),
    });
    let composer = composer(Arc::new(store));

    let page = composer
        .fetch_feed(FeedScope::Profile { user: quoter }, None, 10)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    let quote = &page.items[0];
    assert_eq!(quote.quote_text.as_deref(), Some("look at this"));
    assert!(matches!(quote.reference, Some(ResolvedRef::Tombstone)));
}

#[tokio::test]
async fn retweet_cycle_terminates_in_a_tombstone() {
    let mut store = MemStore::default();
    let author = user(&mut store, "ana");

    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    store.feed_items.push(FeedItemRow {
        id: a,
        user_id: author,
        item_type: FeedItemType::Retweet,
        created_at: ts(0),
        post_id: None,
        ranking_list_id: None,
        retweet_of_id: Some(b),
        quoted_item_id: None,
        quote_text: None,
    });
    store.feed_items.push(FeedItemRow {
        id: b,
        user_id: author,
        item_type: FeedItemType::Retweet,
        created_at: ts(1),
        post_id: None,
        ranking_list_id: None,
        retweet_of_id: Some(a),
        quoted_item_id: None,
        quote_text: None,
    });
    let composer = composer(Arc::new(store));

    let page = composer
        .fetch_feed(FeedScope::Profile { user: author }, None, 10)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    for item in &page.items {
        assert!(matches!(item.reference, Some(ResolvedRef::Tombstone)));
    }
}

#[tokio::test]
async fn retweet_resolves_through_to_the_root_post() {
    let mut store = MemStore::default();
    let author = user(&mut store, "ana");
    let retweeter = user(&mut store, "bob");

    let root = post_item(&mut store, author, "original", ts(0));
    store.feed_items.push(FeedItemRow {
        id: Uuid::new_v4(),
        user_id: retweeter,
        item_type: FeedItemType::Retweet,
        created_at: ts(5),
        post_id: None,
        ranking_list_id: None,
        retweet_of_id: Some(root),
        quoted_item_id: None,
        quote_text: None,
    });
    let composer = composer(Arc::new(store));

    let page = composer
        .fetch_feed(FeedScope::Profile { user: retweeter }, None, 10)
        .await
        .unwrap();
    let retweet = &page.items[0];
    match &retweet.reference {
        Some(ResolvedRef::Root { item }) => {
            assert_eq!(item.id, root);
            match &item.content {
                Some(FeedContent::Post { post }) => assert_eq!(post.content, "original"),
                other => panic!("expected post content, got {other:?}"),
            }
        }
        other => panic!("expected resolved root, got {other:?}"),
    }
}

#[tokio::test]
async fn blob_keys_pass_through_media_resolution_unchanged() {
    let mut store = MemStore::default();
    let author = user(&mut store, "ana");
    if let Some(u) = store.users.get_mut(&author) {
        u.avatar_key = Some("blob:local-preview".to_string());
    }
    post_item(&mut store, author, "hello", ts(0));
    let composer = composer(Arc::new(store));

    let page = composer
        .fetch_feed(FeedScope::Profile { user: author }, None, 10)
        .await
        .unwrap();
    let author_view = page.items[0].author.as_ref().unwrap();
    assert_eq!(author_view.avatar_url.as_deref(), Some("blob:local-preview"));
}

#[tokio::test]
async fn stored_image_keys_resolve_to_signed_urls() {
    let mut store = MemStore::default();
    let author = user(&mut store, "ana");
    let post_id = post_item(&mut store, author, "hello", ts(0));
    let backing = store.feed_items.iter().find(|r| r.id == post_id).unwrap();
    let key = backing.post_id.unwrap();
    if let Some(p) = store.posts.get_mut(&key) {
        p.image_key = Some("posts/abc.jpg".to_string());
    }
    let composer = composer(Arc::new(store));

    let page = composer
        .fetch_feed(FeedScope::Profile { user: author }, None, 10)
        .await
        .unwrap();
    match &page.items[0].content {
        Some(FeedContent::Post { post }) => {
            assert_eq!(
                post.image_url.as_deref(),
                Some("https://cdn.test/posts/abc.jpg?ttl=86400")
            );
        }
        other => panic!("expected post content, got {other:?}"),
    }
}

#[tokio::test]
async fn store_failure_surfaces_as_a_retryable_error() {
    let mut store = MemStore::default();
    let author = user(&mut store, "ana");
    post_item(&mut store, author, "hello", ts(0));
    store.fail.store(true, Ordering::SeqCst);
    let composer = composer(Arc::new(store));

    let err = composer
        .fetch_feed(FeedScope::Profile { user: author }, None, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn ranking_update_carries_the_full_list_view() {
    let mut store = MemStore::default();
    let author = user(&mut store, "ana");

    let list_id = Uuid::new_v4();
    store.lists.insert(
        list_id,
        RankingListRow {
            id: list_id,
            author_id: author,
            subject: "Best Ramen in Tokyo".to_string(),
            sentiment: Sentiment::Like,
            description: None,
            tags: vec!["food".to_string()],
            like_count: 12,
            items: vec![
                feed_service::models::RankingItemRow {
                    rank: 1,
                    item_name: "Ichiran".to_string(),
                    item_description: None,
                    image_key: Some("lists/ichiran.jpg".to_string()),
                },
                feed_service::models::RankingItemRow {
                    rank: 2,
                    item_name: "Afuri".to_string(),
                    item_description: None,
                    image_key: None,
                },
            ],
            created_at: ts(0),
            updated_at: ts(0),
        },
    );
    store.feed_items.push(FeedItemRow {
        id: Uuid::new_v4(),
        user_id: author,
        item_type: FeedItemType::RankingUpdate,
        created_at: ts(0),
        post_id: None,
        ranking_list_id: Some(list_id),
        retweet_of_id: None,
        quoted_item_id: None,
        quote_text: None,
    });
    let composer = composer(Arc::new(store));

    let page = composer
        .fetch_feed(FeedScope::Profile { user: author }, None, 10)
        .await
        .unwrap();
    match &page.items[0].content {
        Some(FeedContent::RankingUpdate { list }) => {
            assert_eq!(list.subject, "Best Ramen in Tokyo");
            assert_eq!(list.items.len(), 2);
            assert_eq!(
                list.items[0].image_url.as_deref(),
                Some("https://cdn.test/lists/ichiran.jpg?ttl=86400")
            );
            assert_eq!(list.items[1].image_url, None);
        }
        other => panic!("expected ranking update content, got {other:?}"),
    }
}
