/// Domain models for the feed composition and trend aggregation subsystem.
///
/// Row types mirror what the content graph store returns; view types are the
/// wire shapes handed to clients (camelCase, resolved media URLs).
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of timeline entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedItemType {
    Post,
    RankingUpdate,
    Retweet,
    QuoteRetweet,
}

impl FeedItemType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Post => "POST",
            Self::RankingUpdate => "RANKING_UPDATE",
            Self::Retweet => "RETWEET",
            Self::QuoteRetweet => "QUOTE_RETWEET",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "POST" => Some(Self::Post),
            "RANKING_UPDATE" => Some(Self::RankingUpdate),
            "RETWEET" => Some(Self::Retweet),
            "QUOTE_RETWEET" => Some(Self::QuoteRetweet),
            _ => None,
        }
    }
}

impl std::fmt::Display for FeedItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ranking list sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Like,
    Dislike,
}

impl Sentiment {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Like => "LIKE",
            Self::Dislike => "DISLIKE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LIKE" => Some(Self::Like),
            "DISLIKE" => Some(Self::Dislike),
            _ => None,
        }
    }
}

/// Aggregation period for trend snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendPeriod {
    Weekly,
    Monthly,
}

impl TrendPeriod {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }

    /// Trailing window the aggregation reads over.
    pub fn window_days(&self) -> i64 {
        match self {
            Self::Weekly => 7,
            Self::Monthly => 30,
        }
    }
}

impl std::fmt::Display for TrendPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which trend aggregate a read targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendKind {
    Subject,
    Tag,
    Item,
}

impl TrendKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Subject => "subject",
            Self::Tag => "tag",
            Self::Item => "item",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "subject" => Some(Self::Subject),
            "tag" => Some(Self::Tag),
            "item" => Some(Self::Item),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audience filter for a feed read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Items authored by users the viewer follows
    Home { viewer: Uuid },
    /// Items authored by one user
    Profile { user: Uuid },
}

/// Keyset position in the (created_at DESC, id DESC) ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPos {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

// ---------------------------------------------------------------------------
// Store rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub avatar_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub image_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RankingItemRow {
    pub rank: i32,
    pub item_name: String,
    pub item_description: Option<String>,
    pub image_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RankingListRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub subject: String,
    pub sentiment: Sentiment,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub like_count: i64,
    pub items: Vec<RankingItemRow>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FeedItemRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_type: FeedItemType,
    pub created_at: DateTime<Utc>,
    /// Set iff item_type == POST
    pub post_id: Option<Uuid>,
    /// Set iff item_type == RANKING_UPDATE
    pub ranking_list_id: Option<Uuid>,
    /// Set iff item_type == RETWEET
    pub retweet_of_id: Option<Uuid>,
    /// Set iff item_type == QUOTE_RETWEET
    pub quoted_item_id: Option<Uuid>,
    pub quote_text: Option<String>,
}

impl FeedItemRow {
    pub fn cursor_pos(&self) -> CursorPos {
        CursorPos {
            created_at: self.created_at,
            id: self.id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRow {
    pub id: Uuid,
    pub list_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Wire views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingItemView {
    pub rank: i32,
    pub item_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingListView {
    pub id: Uuid,
    pub subject: String,
    pub sentiment: Sentiment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub like_count: i64,
    pub items: Vec<RankingItemView>,
    pub created_at: DateTime<Utc>,
}

/// Content a feed item directly carries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FeedContent {
    Post { post: PostView },
    RankingUpdate { list: RankingListView },
}

/// Result of resolving a repost/quote reference chain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResolvedRef {
    /// Non-retweet root the chain terminates at
    Root { item: Box<FeedView> },
    /// Referenced content existed but is gone (or the chain hit the hop cap)
    Tombstone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedView {
    pub id: Uuid,
    pub item_type: FeedItemType,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<FeedContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ResolvedRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub items: Vec<FeedView>,
    pub next_cursor: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Trend aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectCount {
    pub subject: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// Cross-list score for one (subject, item) pair.
///
/// Borda points and average rank are intentionally not normalized for list
/// size; topping a long list outweighs topping a short one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemScore {
    pub subject: String,
    pub item_name: String,
    pub borda_score: i64,
    pub average_rank: f64,
    pub appearances: i64,
}

/// One ranked row of a trend read, from the latest snapshot only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendEntry {
    pub key: String,
    pub metric: f64,
}
