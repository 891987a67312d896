//! Anime Links API Library
//!
//! This library extracts and ranks episode video links from AnimeFLV, keeps a
//! cached catalog of its series and exposes both through REST API endpoints.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod parser;
pub mod routes;
pub mod scraper;
pub mod series;
pub mod service;
