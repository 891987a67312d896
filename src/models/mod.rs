//! Data models for the anime links API
//!
//! Response envelopes and the payloads produced by the service layer.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Re-export parser models for convenience
pub use crate::parser::{CatalogEntry, LinkRecord, SeriesItem, Track};

/// Links found on one episode page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EpisodePageResult {
    /// URL of the mirror that served the page
    pub page_url: String,
    /// Numeric series id declared by the page
    pub anime_id: Option<String>,
    /// Numeric episode id declared by the page
    pub episode_id: Option<String>,
    /// Episode number declared by the page
    pub episode_number: Option<String>,
    /// Links, best first
    pub items: Vec<LinkRecord>,
}

/// One episode of a series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeItem {
    /// Episode id, equal to its number
    pub id: u32,
    /// Episode number
    pub number: u32,
    /// Display title
    pub title: String,
}

impl EpisodeItem {
    pub fn new(number: u32) -> Self {
        Self {
            id: number,
            number,
            title: format!("Episode {}", number),
        }
    }
}

/// Generic API response wrapper for successful responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the operation was successful (always true for this type)
    pub success: bool,
    /// The response payload
    pub data: T,
    /// ISO timestamp of when data was produced
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// Create a new successful API response with the current timestamp
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Whether the operation was successful (always false for errors)
    pub success: bool,
    /// Error message describing what went wrong
    pub error: String,
    /// ISO timestamp of when the error occurred
    pub timestamp: String,
}

impl ApiError {
    /// Create a new API error response with the current timestamp
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
