/// Suggestion service - trivial prefix lookup over distinct subjects and
/// item names.
use crate::db::SuggestionRepo;
use crate::error::Result;

const MAX_SUGGESTIONS: i64 = 20;

pub struct SuggestionService {
    repo: SuggestionRepo,
}

impl SuggestionService {
    pub fn new(repo: SuggestionRepo) -> Self {
        Self { repo }
    }

    pub async fn suggest(&self, prefix: &str, limit: Option<i64>) -> Result<Vec<String>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        let limit = limit.unwrap_or(MAX_SUGGESTIONS).clamp(1, MAX_SUGGESTIONS);
        self.repo.suggest(prefix, limit).await
    }
}
