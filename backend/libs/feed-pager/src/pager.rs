use thiserror::Error;
use tracing::debug;

/// Which feed family a key addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Home,
    Profile,
    Trending,
}

impl FeedKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Home => "home",
            Self::Profile => "profile",
            Self::Trending => "trending",
        }
    }
}

/// Identity of one paged stream. Any parameter change means a different
/// stream; pages from different keys are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedKey {
    pub kind: FeedKind,
    pub target: Option<String>,
    pub tab: Option<String>,
}

impl FeedKey {
    pub fn home() -> Self {
        Self {
            kind: FeedKind::Home,
            target: None,
            tab: None,
        }
    }

    pub fn profile(user_id: impl Into<String>) -> Self {
        Self {
            kind: FeedKind::Profile,
            target: Some(user_id.into()),
            tab: None,
        }
    }

    pub fn with_tab(mut self, tab: impl Into<String>) -> Self {
        self.tab = Some(tab.into());
        self
    }

    /// Cache tag for the feed family this key belongs to, e.g. "feed:home".
    pub fn cache_tag(&self) -> String {
        format!("feed:{}", self.kind.as_str())
    }
}

/// One page as returned by the feed endpoint
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// Fetch the pager asked for. Echo it back to [`Pager::complete`] together
/// with the transport outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub key: FeedKey,
    pub cursor: Option<String>,
    pub epoch: u64,
}

#[derive(Debug, Error)]
pub enum FetchError {
    /// Transient failure; retrying the same request may succeed
    #[error("retryable fetch failure: {0}")]
    Retryable(String),
    /// The request itself was rejected
    #[error("fetch rejected: {0}")]
    Rejected(String),
}

/// Controller phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// No key selected yet
    Idle,
    /// First page for the current key is in flight
    FetchingInitial,
    /// Pages loaded, more available
    Ready,
    /// Next page in flight
    FetchingMore,
    /// Stream exhausted (nextCursor was null)
    ReachedEnd,
    /// Last fetch failed; loaded items are retained and retry is available
    Failed,
}

/// Cursor-pagination state machine for one feed surface.
///
/// At most one fetch is in flight per key: triggers that arrive while a
/// fetch is outstanding are ignored rather than queued, and the outstanding
/// call always completes — its result is applied unless the key changed in
/// the meantime (tracked by an epoch counter).
#[derive(Debug)]
pub struct Pager<T> {
    key: Option<FeedKey>,
    phase: Phase,
    items: Vec<T>,
    next_cursor: Option<String>,
    epoch: u64,
    in_flight: bool,
    last_error: Option<String>,
}

impl<T> Default for Pager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pager<T> {
    pub fn new() -> Self {
        Self {
            key: None,
            phase: Phase::Idle,
            items: Vec::new(),
            next_cursor: None,
            epoch: 0,
            in_flight: false,
            last_error: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn key(&self) -> Option<&FeedKey> {
        self.key.as_ref()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Select the stream to page. A different key discards every loaded page
    /// and issues the initial fetch; re-selecting the current key is a no-op.
    pub fn set_key(&mut self, key: FeedKey) -> Option<FetchRequest> {
        if self.key.as_ref() == Some(&key) {
            return None;
        }

        self.key = Some(key.clone());
        self.items.clear();
        self.next_cursor = None;
        self.last_error = None;
        // Bumping the epoch orphans any in-flight request for the old key;
        // its completion will arrive and be discarded.
        self.epoch += 1;
        self.in_flight = true;
        self.phase = Phase::FetchingInitial;

        Some(FetchRequest {
            key,
            cursor: None,
            epoch: self.epoch,
        })
    }

    /// Scroll-proximity trigger. Issues the next-page fetch when the pager
    /// is ready and nothing is in flight; otherwise ignored.
    pub fn near_end(&mut self) -> Option<FetchRequest> {
        if self.in_flight || self.phase != Phase::Ready {
            return None;
        }
        let key = self.key.clone()?;
        let cursor = self.next_cursor.clone()?;

        self.in_flight = true;
        self.phase = Phase::FetchingMore;

        Some(FetchRequest {
            key,
            cursor: Some(cursor),
            epoch: self.epoch,
        })
    }

    /// Retry after a failure, resuming from the last good cursor.
    pub fn retry(&mut self) -> Option<FetchRequest> {
        if self.in_flight || self.phase != Phase::Failed {
            return None;
        }
        let key = self.key.clone()?;

        self.in_flight = true;
        self.phase = if self.items.is_empty() {
            Phase::FetchingInitial
        } else {
            Phase::FetchingMore
        };

        Some(FetchRequest {
            key,
            cursor: self.next_cursor.clone(),
            epoch: self.epoch,
        })
    }

    /// Apply a completed fetch. Returns false when the result belonged to an
    /// abandoned key and was discarded.
    pub fn complete(
        &mut self,
        request: &FetchRequest,
        result: Result<Page<T>, FetchError>,
    ) -> bool {
        if request.epoch != self.epoch {
            debug!(
                request_epoch = request.epoch,
                current_epoch = self.epoch,
                "Discarding stale fetch result"
            );
            return false;
        }

        self.in_flight = false;
        match result {
            Ok(page) => {
                self.items.extend(page.items);
                self.next_cursor = page.next_cursor;
                self.last_error = None;
                self.phase = if self.next_cursor.is_some() {
                    Phase::Ready
                } else {
                    Phase::ReachedEnd
                };
            }
            Err(e) => {
                // Loaded items are never dropped on failure.
                self.last_error = Some(e.to_string());
                self.phase = Phase::Failed;
            }
        }
        true
    }

    /// Apply a confirmed local mutation (e.g. a like toggle) to loaded items
    /// only. Cursor state is untouched; the next refetch supersedes this.
    pub fn mutate_items(&mut self, mut f: impl FnMut(&mut T)) {
        for item in &mut self.items {
            f(item);
        }
    }
}
