/// Feed Composer
///
/// Cursor-paginated retrieval of feed items for an audience filter, with
/// bounded recursive reference resolution and per-page media resolution.
///
/// Ordering key is (created_at DESC, id DESC), a strict total order used both
/// for the page query and the cursor boundary, so replaying the same
/// (scope, cursor) with no intervening writes returns identical pages.
use futures::future::{join_all, BoxFuture, FutureExt};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::models::{
    AuthorView, FeedContent, FeedItemRow, FeedItemType, FeedPage, FeedScope, FeedView, PostView,
    RankingItemView, RankingListView, ResolvedRef,
};
use crate::services::media_broker::{MediaBroker, TtlContext};

/// Hard cap on requested page size
pub const MAX_PAGE_SIZE: u32 = 50;

/// Reference chains resolve the direct reference plus at most one further
/// hop. The cap guarantees termination even if the graph contains a cycle.
const MAX_REFERENCE_HOPS: u8 = 2;

pub struct FeedComposer {
    store: Arc<dyn ContentStore>,
    broker: Arc<MediaBroker>,
}

impl FeedComposer {
    pub fn new(store: Arc<dyn ContentStore>, broker: Arc<MediaBroker>) -> Self {
        Self { store, broker }
    }

    /// Fetch one page. `cursor` is the id of the last item of the previous
    /// page (exclusive); `next_cursor` is `Some` iff the stream has more.
    ///
    /// An empty audience yields an empty page, not an error. Store failures
    /// propagate as retryable errors and are never folded into a
    /// "stream exhausted" response.
    pub async fn fetch_feed(
        &self,
        scope: FeedScope,
        cursor: Option<Uuid>,
        limit: u32,
    ) -> Result<FeedPage> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE) as i64;

        let after = match cursor {
            Some(id) => Some(
                self.store
                    .cursor_position(id)
                    .await?
                    .ok_or_else(|| AppError::BadRequest("Unknown cursor".to_string()))?,
            ),
            None => None,
        };

        // Fetch limit + 1 candidates; the extra row only signals whether a
        // further page exists and is never emitted.
        let mut rows = self
            .store
            .feed_page(&scope, after.as_ref(), limit + 1)
            .await?;

        let has_more = rows.len() as i64 == limit + 1;
        if has_more {
            rows.truncate(limit as usize);
        }
        let next_cursor = if has_more {
            rows.last().map(|row| row.id)
        } else {
            None
        };

        let items = join_all(
            rows.into_iter()
                .map(|row| self.compose_item(row, MAX_REFERENCE_HOPS)),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

        Ok(FeedPage { items, next_cursor })
    }

    /// Build the view for one feed item, resolving references with `hops`
    /// budget remaining. Boxed because reference resolution recurses.
    fn compose_item(&self, row: FeedItemRow, hops: u8) -> BoxFuture<'_, Result<FeedView>> {
        async move {
            let author = self.author_view(row.user_id).await?;

            let mut content = None;
            let mut reference = None;
            match row.item_type {
                FeedItemType::Post => {
                    content = match row.post_id {
                        Some(post_id) => self.post_view(post_id).await?.map(|post| FeedContent::Post { post }),
                        None => None,
                    };
                }
                FeedItemType::RankingUpdate => {
                    content = match row.ranking_list_id {
                        Some(list_id) => self
                            .list_view(list_id)
                            .await?
                            .map(|list| FeedContent::RankingUpdate { list }),
                        None => None,
                    };
                }
                FeedItemType::Retweet => {
                    reference = Some(match row.retweet_of_id {
                        Some(target) => self.resolve_reference(target, hops).await?,
                        None => ResolvedRef::Tombstone,
                    });
                }
                FeedItemType::QuoteRetweet => {
                    reference = Some(match row.quoted_item_id {
                        Some(target) => self.resolve_reference(target, hops).await?,
                        None => ResolvedRef::Tombstone,
                    });
                }
            }

            Ok(FeedView {
                id: row.id,
                item_type: row.item_type,
                created_at: row.created_at,
                author,
                content,
                quote_text: row.quote_text,
                reference,
            })
        }
        .boxed()
    }

    /// Walk a repost/quote reference to its non-retweet root. Missing items,
    /// missing content, and exhausted hop budgets all yield a tombstone so
    /// the dependent item is still emitted.
    fn resolve_reference(&self, id: Uuid, hops: u8) -> BoxFuture<'_, Result<ResolvedRef>> {
        async move {
            if hops == 0 {
                return Ok(ResolvedRef::Tombstone);
            }

            let Some(row) = self.store.feed_item(id).await? else {
                return Ok(ResolvedRef::Tombstone);
            };

            // A plain retweet carries no display content of its own; keep
            // following the chain toward the root.
            if row.item_type == FeedItemType::Retweet {
                return match row.retweet_of_id {
                    Some(next) => self.resolve_reference(next, hops - 1).await,
                    None => Ok(ResolvedRef::Tombstone),
                };
            }

            let is_content_item = matches!(
                row.item_type,
                FeedItemType::Post | FeedItemType::RankingUpdate
            );
            let view = self.compose_item(row, hops - 1).await?;

            if is_content_item && view.content.is_none() {
                // The item survived but its source content was deleted.
                return Ok(ResolvedRef::Tombstone);
            }

            Ok(ResolvedRef::Root {
                item: Box::new(view),
            })
        }
        .boxed()
    }

    async fn author_view(&self, user_id: Uuid) -> Result<Option<AuthorView>> {
        let Some(user) = self.store.user(user_id).await? else {
            return Ok(None);
        };
        let avatar_url = self
            .broker
            .resolve(user.avatar_key.as_deref(), TtlContext::FeedDisplay)
            .await;
        Ok(Some(AuthorView {
            id: user.id,
            username: user.username,
            name: user.name,
            avatar_url,
        }))
    }

    async fn post_view(&self, post_id: Uuid) -> Result<Option<PostView>> {
        let Some(post) = self.store.post(post_id).await? else {
            return Ok(None);
        };
        let image_url = self
            .broker
            .resolve(post.image_key.as_deref(), TtlContext::FeedDisplay)
            .await;
        Ok(Some(PostView {
            id: post.id,
            content: post.content,
            image_url,
            created_at: post.created_at,
        }))
    }

    async fn list_view(&self, list_id: Uuid) -> Result<Option<RankingListView>> {
        let Some(list) = self.store.ranking_list(list_id).await? else {
            return Ok(None);
        };

        let image_urls = self
            .broker
            .resolve_many(
                list.items.iter().map(|i| i.image_key.clone()).collect(),
                TtlContext::FeedDisplay,
            )
            .await;

        let items = list
            .items
            .into_iter()
            .zip(image_urls)
            .map(|(item, image_url)| RankingItemView {
                rank: item.rank,
                item_name: item.item_name,
                item_description: item.item_description,
                image_url,
            })
            .collect();

        Ok(Some(RankingListView {
            id: list.id,
            subject: list.subject,
            sentiment: list.sentiment,
            description: list.description,
            tags: list.tags,
            like_count: list.like_count,
            items,
            created_at: list.created_at,
        }))
    }
}
