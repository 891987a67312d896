//! Constants module for the anime links API
//!
//! Contains upstream path builders, the host preference order and
//! configuration defaults.

/// Path builders for upstream pages, relative to a candidate base host
pub mod endpoints {
    /// Episode player page
    pub fn episode(slug: &str, number: u32) -> String {
        format!("/ver/{}-{}", slug, number)
    }

    /// Paginated catalog listing
    pub fn browse(page: u32) -> String {
        format!("/browse?page={}", page)
    }

    /// Search through the listing endpoint
    pub fn search(query: &str) -> String {
        format!("/browse?q={}", urlencoding::encode(query))
    }

    /// Series page with the embedded episode list
    pub fn anime(slug: &str) -> String {
        format!("/anime/{}", slug)
    }
}

/// Video host handling
pub mod hosts {
    /// Host names in order of preference, best first
    pub const PREFERRED: &[&str] = &[
        "sw",
        "streamwish",
        "sb",
        "streamsb",
        "sbplay",
        "stape",
        "okru",
        "uqload",
        "mega",
    ];
}

/// Defaults for every configurable setting
pub mod defaults {
    pub const HOST: &str = "127.0.0.1";
    pub const PORT: u16 = 8001;

    pub const BASE_CANDIDATES: &[&str] = &[
        "https://www3.animeflv.net",
        "https://www2.animeflv.net",
        "https://www.animeflv.net",
    ];

    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    pub const REQUEST_TIMEOUT_SECS: u64 = 20;
    pub const RETRY_ATTEMPTS: u32 = 3;
    pub const RETRY_DELAY_MS: u64 = 800;

    /// Six hours
    pub const CATALOG_TTL_SECS: u64 = 6 * 3600;
    pub const CATALOG_MAX_PAGES: u32 = 200;
    pub const CATALOG_PAGE_DELAY_MS: u64 = 0;

    pub const TITLE_CUTOFF: f64 = 0.6;
}
