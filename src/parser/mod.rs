//! Parser module for extracting structured data from upstream HTML
//!
//! Episode pages carry their links as inline script variables, which are
//! matched with regular expressions ([`embedded`]). The extracted block is
//! normalized and ranked in [`links`]. Listing and search pages are handled
//! by [`listing`].

pub mod embedded;
pub mod links;
pub mod listing;

pub use embedded::{EmbeddedDataExtractor, RegexExtractor, ScalarIds};
pub use links::{flatten, flatten_and_rank, pick_best, rank, LinkRecord, Track};
pub use listing::{parse_catalog_page, parse_search_results, CatalogEntry, SeriesItem};

use thiserror::Error;

/// Errors raised while pulling embedded data out of a page
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The named script variable is not present in the page
    #[error("no '{0}' block found in page")]
    BlockMissing(&'static str),

    /// The block was found but could not be parsed, even after cleanup
    #[error("could not parse '{name}' block: {reason}")]
    Unparsable { name: &'static str, reason: String },

    /// The block parsed but held no usable links
    #[error("no links found in '{0}' block")]
    NoLinks(&'static str),
}

/// Declare a lazily compiled static regex
macro_rules! static_regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: std::sync::LazyLock<regex::Regex> =
            std::sync::LazyLock::new(|| regex::Regex::new($regex).unwrap());
    };
}

/// Declare a lazily parsed static CSS selector
macro_rules! static_selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: std::sync::LazyLock<scraper::Selector> =
            std::sync::LazyLock::new(|| scraper::Selector::parse($css).unwrap());
    };
}

pub(crate) use static_regex;
pub(crate) use static_selector;
