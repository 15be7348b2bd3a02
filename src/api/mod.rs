//! REST API client module for the WaniKani v2 API.
//!
//! This module provides the `ApiClient` for fetching paginated review,
//! subject, and assignment collections.
//!
//! The API uses bearer token authentication with a per-user API key.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
