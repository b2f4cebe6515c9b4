//! Blob storage for uploaded files.
//!
//! # Responsibility
//! - Define the upload contract used by file-backed collections.
//! - Provide a filesystem-backed implementation for local deployments.

pub mod blob_store;
