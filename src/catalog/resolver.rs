//! Fuzzy title to identifier resolution over the cached catalog

use std::sync::Arc;

use tracing::debug;

use super::cache::CatalogCache;
use crate::parser::CatalogEntry;
use crate::scraper::FetchError;

/// Resolves free-form titles against the catalog cache
#[derive(Clone)]
pub struct TitleResolver {
    cache: Arc<CatalogCache>,
}

impl TitleResolver {
    pub fn new(cache: Arc<CatalogCache>) -> Self {
        Self { cache }
    }

    /// Best catalog entry for `query` scoring at least `cutoff`
    pub async fn resolve(
        &self,
        query: &str,
        cutoff: f64,
    ) -> Result<Option<CatalogEntry>, FetchError> {
        let view = self.cache.get(false).await?;
        let found = best_match(view.entries(), query, cutoff).cloned();
        debug!(
            "Resolved {:?} at cutoff {} to {:?}",
            query,
            cutoff,
            found.as_ref().map(|e| &e.id)
        );
        Ok(found)
    }
}

/// Highest scoring entry at or above `cutoff`; ties go to the earlier entry
pub fn best_match<'a>(
    entries: &'a [CatalogEntry],
    query: &str,
    cutoff: f64,
) -> Option<&'a CatalogEntry> {
    let cutoff = cutoff.clamp(0.0, 1.0);
    let query: Vec<char> = query.trim().to_lowercase().chars().collect();

    let mut best: Option<(&CatalogEntry, f64)> = None;
    for entry in entries {
        let title: Vec<char> = entry.title.to_lowercase().chars().collect();
        let score = ratio(&query, &title);
        if score < cutoff {
            continue;
        }
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((entry, score));
        }
    }

    best.map(|(entry, _)| entry)
}

/// Case-insensitive similarity of two strings in `[0, 1]`
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    ratio(&a, &b)
}

/// Gestalt pattern matching: `2 * matches / (len(a) + len(b))`
fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(a, b) as f64 / total as f64
}

/// Characters covered by the longest common block and, recursively, the blocks on either side of it
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, size) = longest_common_block(a, b);
    if size == 0 {
        return 0;
    }
    size + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + size..], &b[j + size..])
}

/// Start in `a`, start in `b` and length of the earliest longest common substring
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb { previous[j] + 1 } else { 0 };
            let size = current[j + 1];
            if size > best.2 {
                best = (i + 1 - size, j + 1 - size, size);
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    best
}
