pub mod comments;
pub mod feed_composer;
pub mod media_broker;
pub mod suggestions;
pub mod trend_aggregator;
pub mod trends;
pub mod url_signer;

pub use comments::CommentService;
pub use feed_composer::{FeedComposer, MAX_PAGE_SIZE};
pub use media_broker::{MediaBroker, TtlContext};
pub use suggestions::SuggestionService;
pub use trend_aggregator::{item_scores, subject_counts, tag_counts, TrendAggregator, TrendRunReport};
pub use trends::{TrendResponse, TrendService};
pub use url_signer::{CredentialIssuer, UrlSigner};
