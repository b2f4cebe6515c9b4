//! Domain model for study hub collections.
//!
//! # Responsibility
//! - Name the collections the admin console manages.
//! - Define the raw stored-document shape shared by every collection.
//! - Define typed records with their required-field rules.
//!
//! # Invariants
//! - Every stored document is identified by a store-generated `DocumentId`.
//! - Deletion is a hard delete; there are no tombstones.
//! - The only write-time invariant is "required fields present".

pub mod document;
pub mod record;
