pub mod comments;
pub mod feed;
pub mod suggestions;
pub mod trending;

use actix_web::HttpRequest;
use uuid::Uuid;

use crate::error::{AppError, Result};

pub use comments::{create_comment, delete_comment, list_comments, CommentHandlerState};
pub use feed::{get_home_feed, get_profile_feed, FeedHandlerState};
pub use suggestions::{get_suggestions, SuggestionHandlerState};
pub use trending::{get_trending, TrendHandlerState};

/// Caller identity, placed in the `x-user-id` header by the identity layer
/// in front of this service. Verification itself is not this service's job.
pub(crate) fn viewer_id(req: &HttpRequest) -> Result<Uuid> {
    req.headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| AppError::Unauthorized("Missing user context".into()))
}
