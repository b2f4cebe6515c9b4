//! Document store contracts and persistence implementations.
//!
//! # Responsibility
//! - Define the store operations every use case goes through.
//! - Keep SQLite query details out of services.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Stored `fields` are always JSON objects.

pub mod document_repo;
