use std::collections::{HashMap, HashSet};
use tracing::debug;

struct Entry<V> {
    value: V,
    tags: HashSet<String>,
}

/// Tag-based cache registry.
///
/// Entries are stored under an exact key and additionally labelled with tags
/// naming the families they belong to (e.g. `"feed:home"`). A mutation that
/// affects a whole family invalidates by tag instead of pattern-matching
/// over key strings.
pub struct TagCache<V> {
    entries: HashMap<String, Entry<V>>,
}

impl<V> Default for TagCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TagCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        tags: impl IntoIterator<Item = impl Into<String>>,
        value: V,
    ) {
        self.entries.insert(
            key.into(),
            Entry {
                value,
                tags: tags.into_iter().map(Into::into).collect(),
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key).map(|e| &e.value)
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    /// Drop every entry labelled with `tag`. Returns how many were removed.
    pub fn invalidate_tag(&mut self, tag: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.tags.contains(tag));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(tag, removed, "Invalidated cache entries by tag");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
