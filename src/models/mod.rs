//! Data models for cached WaniKani records.
//!
//! - `Category`: the closed set of record kinds (reviews, subjects,
//!   assignments) synced independently.
//! - `Resource`, `Collection`, `Pages`: wire types for the remote API's
//!   resource envelopes and paginated collection responses.

pub mod category;
pub mod resource;

pub use category::Category;
pub use resource::{Collection, Pages, Resource};
