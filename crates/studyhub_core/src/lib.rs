//! Core domain logic for the StudyHub admin console.
//! This crate is the single source of truth for collection rules and the
//! cross-collection uploads feed.

pub mod config;
pub mod db;
pub mod feed;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::{ConfigError, CoreConfig};
pub use feed::uploads::{
    aggregate_uploads, filter_uploads, merge_uploads, top_recent, UploadItem, UploadKind,
    UploadsFeed,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{Collection, DocumentId, Fields, StoredDocument};
pub use model::record::{
    Assignment, Book, ExamEntry, FileBackedRecord, Note, Notice, RecordValidationError,
    StudyRecord,
};
pub use repo::document_repo::{DocumentStore, RepoError, RepoResult, SqliteDocumentStore};
pub use service::collection_service::{
    CollectionService, FileUpload, RecordEntry, ServiceError, ServiceResult,
};
pub use service::dashboard_service::{
    CollectionStats, DashboardService, DashboardSnapshot, DEFAULT_RECENT_LIMIT,
};
pub use service::{AssignmentService, BookService, ExamService, NoteService, NoticeService};
pub use storage::blob_store::{BlobError, BlobResult, BlobStore, FsBlobStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
