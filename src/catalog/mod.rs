//! Catalog module: crawling, caching and title resolution
//!
//! The catalog is the deduplicated list of every series the site lists,
//! built by walking the paginated browse endpoint.

pub mod cache;
pub mod crawler;
pub mod resolver;
pub mod snapshot;

pub use cache::{CacheSettings, CatalogCache, CatalogView};
pub use crawler::CatalogCrawler;
pub use resolver::{best_match, similarity, TitleResolver};
pub use snapshot::{SnapshotError, SnapshotStore};

pub use crate::parser::CatalogEntry;
