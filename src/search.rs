// Link search: provider contract and per-session result cache
//
// Requests are never cancelled and may resolve in any order. Every
// resolution is stored under the query it was issued for, and the display
// falls back to the last resolved query while a newer one is in flight.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

/// One suggestion offered by the search provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub subtitle: String,
}

impl SearchResult {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        subtitle: impl Into<String>,
    ) -> Self {
        SearchResult {
            url: url.into(),
            title: title.into(),
            subtitle: subtitle.into(),
        }
    }
}

/// Why a search produced no results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The provider reported a failure
    Provider(String),
    /// The provider went away before answering
    Dropped,
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::Provider(msg) => write!(f, "search failed: {msg}"),
            SearchError::Dropped => write!(f, "search was dropped before it finished"),
        }
    }
}

impl std::error::Error for SearchError {}

pub type SearchFuture = Pin<Box<dyn Future<Output = Result<Vec<SearchResult>, SearchError>>>>;

/// Host-side search backend
pub trait SearchProvider {
    fn search(&self, query: &str) -> SearchFuture;
}

impl<F> SearchProvider for F
where
    F: Fn(&str) -> SearchFuture,
{
    fn search(&self, query: &str) -> SearchFuture {
        self(query)
    }
}

/// A search that has been issued but not yet awaited
pub struct PendingSearch {
    query: String,
    future: SearchFuture,
}

impl PendingSearch {
    pub fn new(query: impl Into<String>, future: SearchFuture) -> Self {
        PendingSearch {
            query: query.into(),
            future,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Wait for the provider and pair its answer with the query it belongs to
    pub async fn resolve(self) -> SearchOutcome {
        let result = self.future.await;
        SearchOutcome {
            query: self.query,
            result,
        }
    }
}

impl fmt::Debug for PendingSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSearch")
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

/// A finished search, ready to be fed back into the session
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub query: String,
    pub result: Result<Vec<SearchResult>, SearchError>,
}

/// Results keyed by the trimmed query that produced them
#[derive(Debug, Default)]
pub struct SearchCache {
    entries: HashMap<String, Vec<SearchResult>>,
    previous_query: String,
}

impl SearchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved search.
    ///
    /// The query becomes the fallback for display even if a newer query has
    /// been issued since; whichever resolves last wins.
    pub fn store(&mut self, query: impl Into<String>, results: Vec<SearchResult>) {
        let query = query.into();
        debug!(query = %query, count = results.len(), "search resolved");
        self.previous_query = query.clone();
        self.entries.insert(query, results);
    }

    /// Feed a finished search into the cache; failures leave it untouched
    pub fn apply(&mut self, outcome: SearchOutcome) {
        match outcome.result {
            Ok(results) => self.store(outcome.query, results),
            Err(err) => warn!(query = %outcome.query, error = %err, "link search failed"),
        }
    }

    pub fn get(&self, query: &str) -> Option<&[SearchResult]> {
        self.entries.get(query).map(Vec::as_slice)
    }

    /// Last query that resolved successfully
    pub fn previous_query(&self) -> &str {
        &self.previous_query
    }

    /// Results to show for the given input: its own entry, else the entry of
    /// the last resolved query, else nothing
    pub fn displayed(&self, input: &str) -> &[SearchResult] {
        self.get(input.trim())
            .or_else(|| self.get(&self.previous_query))
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str) -> SearchResult {
        SearchResult::new(format!("/{title}"), title, "")
    }

    #[test]
    fn test_displayed_prefers_current_query() {
        let mut cache = SearchCache::new();
        cache.store("a", vec![result("apple"), result("avocado")]);
        cache.store("ab", vec![result("abacus")]);
        assert_eq!(cache.displayed("a"), &[result("apple"), result("avocado")]);
        assert_eq!(cache.displayed(" ab "), &[result("abacus")]);
    }

    #[test]
    fn test_displayed_falls_back_to_previous_query() {
        let mut cache = SearchCache::new();
        cache.store("do", vec![result("docs")]);
        // "doc" is still in flight
        assert_eq!(cache.displayed("doc"), &[result("docs")]);
    }

    #[test]
    fn test_displayed_empty_without_results() {
        let cache = SearchCache::new();
        assert!(cache.displayed("anything").is_empty());
    }

    #[test]
    fn test_late_resolution_wins_previous_query() {
        let mut cache = SearchCache::new();
        cache.store("ab", vec![result("abacus")]);
        cache.store("a", vec![result("apple")]);

        assert_eq!(cache.previous_query(), "a");
        assert_eq!(cache.get("a"), Some(&[result("apple")][..]));
        assert_eq!(cache.get("ab"), Some(&[result("abacus")][..]));
        // Display still follows the input, not the resolution order
        assert_eq!(cache.displayed("ab"), &[result("abacus")]);
        assert_eq!(cache.displayed("abc"), &[result("apple")]);
    }

    #[test]
    fn test_same_query_last_write_wins() {
        let mut cache = SearchCache::new();
        cache.store("x", vec![result("one")]);
        cache.store("x", vec![result("two")]);
        assert_eq!(cache.get("x"), Some(&[result("two")][..]));
    }

    #[test]
    fn test_failure_leaves_cache_untouched() {
        let mut cache = SearchCache::new();
        cache.store("a", vec![result("apple")]);
        cache.apply(SearchOutcome {
            query: "ab".to_string(),
            result: Err(SearchError::Provider("offline".to_string())),
        });
        assert_eq!(cache.get("ab"), None);
        assert_eq!(cache.previous_query(), "a");
    }
}
