//! Dashboard and global-search use-cases.
//!
//! # Responsibility
//! - Load the four feed collections once per request.
//! - Derive per-collection counts and the recent-uploads summary.
//! - Hand the search screen a retained, filterable feed.

use crate::feed::uploads::{aggregate_uploads, top_recent, UploadItem, UploadsFeed};
use crate::model::document::{Collection, StoredDocument};
use crate::repo::document_repo::{DocumentStore, RepoResult};
use log::info;
use std::time::Instant;

/// Number of items shown in the dashboard's recent-uploads card.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Document counts shown on the dashboard stat cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub books: u64,
    pub notes: u64,
    pub assignments: u64,
    pub notices: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSnapshot {
    pub stats: CollectionStats,
    /// Newest-first, at most the requested limit.
    pub recent: Vec<UploadItem>,
}

pub struct DashboardService<S: DocumentStore> {
    store: S,
}

struct FeedSources {
    books: Vec<StoredDocument>,
    notes: Vec<StoredDocument>,
    assignments: Vec<StoredDocument>,
    notices: Vec<StoredDocument>,
}

impl FeedSources {
    fn stats(&self) -> CollectionStats {
        CollectionStats {
            books: self.books.len() as u64,
            notes: self.notes.len() as u64,
            assignments: self.assignments.len() as u64,
            notices: self.notices.len() as u64,
        }
    }

    fn aggregate(&self) -> Vec<UploadItem> {
        aggregate_uploads(&self.books, &self.notes, &self.assignments, &self.notices)
    }
}

impl<S: DocumentStore> DashboardService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Builds the dashboard view: counts plus the `recent_limit` newest uploads.
    pub fn snapshot(&self, recent_limit: usize) -> RepoResult<DashboardSnapshot> {
        let started_at = Instant::now();
        let sources = self.load_sources()?;
        let feed = sources.aggregate();
        let snapshot = DashboardSnapshot {
            stats: sources.stats(),
            recent: top_recent(&feed, recent_limit),
        };

        info!(
            "event=dashboard_load module=service status=ok feed_len={} duration_ms={}",
            feed.len(),
            started_at.elapsed().as_millis()
        );
        Ok(snapshot)
    }

    /// Full aggregated feed for the all-uploads search screen.
    pub fn uploads_feed(&self) -> RepoResult<UploadsFeed> {
        let sources = self.load_sources()?;
        Ok(UploadsFeed::new(sources.aggregate()))
    }

    fn load_sources(&self) -> RepoResult<FeedSources> {
        Ok(FeedSources {
            books: self.store.list_documents(Collection::Books)?,
            notes: self.store.list_documents(Collection::Notes)?,
            assignments: self.store.list_documents(Collection::Assignments)?,
            notices: self.store.list_documents(Collection::Notices)?,
        })
    }
}
