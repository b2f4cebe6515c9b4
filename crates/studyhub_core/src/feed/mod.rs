//! Cross-collection feeds.
//!
//! # Responsibility
//! - Merge heterogeneous collections into one time-ordered upload feed.
//! - Keep feed shaping (filter, truncation) inside core.
//!
//! # See also
//! - `service::dashboard_service` for the store-backed entry points.

pub mod uploads;
