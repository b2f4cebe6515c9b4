//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the admin console use-cases to Dart via FRB.
//! - Resolve database and blob locations from `STUDYHUB_*` environment once.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are reported inside response envelopes, never as panics.
//! - Record ids cross the boundary as hyphenated UUID strings.

use log::warn;
use studyhub_core::db::open_db;
use studyhub_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Assignment, Book, Collection, CollectionService, CoreConfig, DashboardService, DocumentId,
    DocumentStore, ExamEntry, FileBackedRecord, FileUpload, Note, Notice, RecordEntry,
    SqliteDocumentStore, StudyRecord, UploadItem,
};
use std::sync::OnceLock;
use uuid::Uuid;

const DASHBOARD_RECENT_MAX: u32 = 50;
static ENTRY_CONFIG: OnceLock<Result<CoreConfig, String>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One row of the uploads feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFeedItem {
    pub id: String,
    /// Display name (title, or legacy name, or empty).
    pub name: String,
    /// Source label: `Book|Note|Assignment|Notice`.
    pub kind: String,
    pub created_at_ms: i64,
}

/// Dashboard stat card values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub books: u64,
    pub notes: u64,
    pub assignments: u64,
    pub notices: u64,
}

/// Dashboard response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardResponse {
    pub ok: bool,
    pub counts: DashboardCounts,
    /// Newest-first, at most the applied limit.
    pub recent: Vec<UploadFeedItem>,
    pub message: String,
    pub applied_limit: u32,
}

/// Search response envelope for the all-uploads screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadsResponse {
    pub items: Vec<UploadFeedItem>,
    /// Size of the unfiltered feed.
    pub total: u32,
    pub message: String,
}

/// One top-level field of a listed record, rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordListItem {
    pub id: String,
    pub name: String,
    pub created_at_ms: i64,
    pub fields: Vec<RecordField>,
}

/// List response envelope for one collection screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordListResponse {
    pub items: Vec<RecordListItem>,
    pub message: String,
}

/// Generic action response envelope for create/update/delete flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected record ID on success.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: DocumentId) -> Self {
        Self {
            ok: true,
            id: Some(id.to_string()),
            message: message.into(),
        }
    }

    fn failure(op: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        warn!("event=ffi_call module=ffi status=error op={op}");
        Self {
            ok: false,
            id: None,
            message: format!("{op} failed: {message}"),
        }
    }
}

/// Loads dashboard counts and the newest uploads.
///
/// # FFI contract
/// - `recent_limit=None|Some(0)` uses `STUDYHUB_RECENT_LIMIT` (default 5).
/// - Limits above 50 are clamped.
/// - Never panics; `ok=false` carries the failure message.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_load(recent_limit: Option<u32>) -> DashboardResponse {
    let result = resolve_config().and_then(|config| {
        let limit = normalize_recent_limit(recent_limit, config.recent_limit);
        with_store(config, |store| {
            DashboardService::new(store)
                .snapshot(limit as usize)
                .map_err(|err| err.to_string())
        })
        .map(|snapshot| (snapshot, limit))
    });

    match result {
        Ok((snapshot, applied_limit)) => DashboardResponse {
            ok: true,
            counts: DashboardCounts {
                books: snapshot.stats.books,
                notes: snapshot.stats.notes,
                assignments: snapshot.stats.assignments,
                notices: snapshot.stats.notices,
            },
            recent: snapshot.recent.into_iter().map(to_feed_item).collect(),
            message: "Dashboard loaded.".to_string(),
            applied_limit,
        },
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op=dashboard_load");
            DashboardResponse {
                ok: false,
                counts: DashboardCounts::default(),
                recent: Vec::new(),
                message: format!("dashboard_load failed: {err}"),
                applied_limit: 0,
            }
        }
    }
}

/// Filters the uploads feed by case-insensitive name substring.
///
/// # FFI contract
/// - `query` is matched as given, whitespace included.
/// - Empty `query` returns the whole feed.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn uploads_search(query: String) -> UploadsResponse {
    let result = resolve_config().and_then(|config| {
        with_store(config, |store| {
            DashboardService::new(store)
                .uploads_feed()
                .map_err(|err| err.to_string())
        })
    });

    match result {
        Ok(mut feed) => {
            let total = u32::try_from(feed.len()).unwrap_or(u32::MAX);
            let items = feed
                .set_query(query)
                .iter()
                .cloned()
                .map(to_feed_item)
                .collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No uploads found.".to_string()
            } else {
                format!("Found {} upload(s).", items.len())
            };
            UploadsResponse {
                items,
                total,
                message,
            }
        }
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op=uploads_search");
            UploadsResponse {
                items: Vec::new(),
                total: 0,
                message: format!("uploads_search failed: {err}"),
            }
        }
    }
}

/// Uploads a PDF and creates the book pointing at it.
#[flutter_rust_bridge::frb(sync)]
pub fn book_publish(
    title: String,
    semester: String,
    subject: String,
    file_name: String,
    file_bytes: Vec<u8>,
) -> ActionResponse {
    let book = Book {
        title: title.trim().to_string(),
        semester: semester.trim().to_string(),
        subject: subject.trim().to_string(),
        file_url: String::new(),
    };
    publish_record("book_publish", "Book published.", book, file_name, file_bytes)
}

/// Uploads a PDF and creates the lecture note pointing at it.
#[flutter_rust_bridge::frb(sync)]
pub fn note_publish(
    title: String,
    semester: String,
    subject: String,
    lecture_no: String,
    file_name: String,
    file_bytes: Vec<u8>,
) -> ActionResponse {
    let note = Note {
        title: title.trim().to_string(),
        semester: semester.trim().to_string(),
        subject: subject.trim().to_string(),
        lecture_no: lecture_no.trim().to_string(),
        file_url: String::new(),
    };
    publish_record("note_publish", "Note published.", note, file_name, file_bytes)
}

/// Creates an assignment, or updates it when `id` is given.
#[flutter_rust_bridge::frb(sync)]
pub fn assignment_save(
    id: Option<String>,
    title: String,
    subject: String,
    due_date: String,
    description: String,
) -> ActionResponse {
    let assignment = Assignment {
        title: title.trim().to_string(),
        subject: subject.trim().to_string(),
        due_date: due_date.trim().to_string(),
        description: description.trim().to_string(),
    };
    save_record("assignment_save", id, assignment)
}

/// Creates a notice, or updates it when `id` is given.
#[flutter_rust_bridge::frb(sync)]
pub fn notice_save(
    id: Option<String>,
    title: String,
    description: String,
    date: String,
) -> ActionResponse {
    let notice = Notice {
        title: title.trim().to_string(),
        description: description.trim().to_string(),
        date: date.trim().to_string(),
    };
    save_record("notice_save", id, notice)
}

/// Creates an exam routine entry, or updates it when `id` is given.
#[flutter_rust_bridge::frb(sync)]
pub fn exam_save(
    id: Option<String>,
    subject: String,
    date: String,
    time: String,
    semester: String,
    room: String,
) -> ActionResponse {
    let exam = ExamEntry {
        subject: subject.trim().to_string(),
        date: date.trim().to_string(),
        time: time.trim().to_string(),
        semester: semester.trim().to_string(),
        room: room.trim().to_string(),
    };
    save_record("exam_save", id, exam)
}

/// Lists one collection newest-first.
///
/// # FFI contract
/// - `collection` accepts plural or singular names, case-insensitive.
/// - Field values are rendered as plain text; strings are not quoted.
#[flutter_rust_bridge::frb(sync)]
pub fn collection_list(collection: String) -> RecordListResponse {
    let result = parse_collection(&collection).and_then(|collection| {
        let config = resolve_config()?;
        with_store(config, |store| match collection {
            Collection::Books => list_entries::<Book>(store),
            Collection::Notes => list_entries::<Note>(store),
            Collection::Assignments => list_entries::<Assignment>(store),
            Collection::Notices => list_entries::<Notice>(store),
            Collection::Exams => list_entries::<ExamEntry>(store),
        })
    });

    match result {
        Ok(items) => RecordListResponse {
            message: format!("Loaded {} record(s).", items.len()),
            items,
        },
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op=collection_list");
            RecordListResponse {
                items: Vec::new(),
                message: format!("collection_list failed: {err}"),
            }
        }
    }
}

/// Permanently deletes one record.
#[flutter_rust_bridge::frb(sync)]
pub fn document_delete(collection: String, id: String) -> ActionResponse {
    let result = parse_collection(&collection).and_then(|collection| {
        let id = parse_document_id(&id)?;
        let config = resolve_config()?;
        with_store(config, |store| {
            store
                .delete_document(collection, id)
                .map_err(|err| err.to_string())
        })?;
        Ok(id)
    });

    match result {
        Ok(id) => ActionResponse::success("Record deleted.", id),
        Err(err) => ActionResponse::failure("document_delete", err),
    }
}

fn publish_record<T: FileBackedRecord>(
    op: &'static str,
    message: &str,
    record: T,
    file_name: String,
    file_bytes: Vec<u8>,
) -> ActionResponse {
    let file = FileUpload::new(file_name.trim(), file_bytes);
    let result = resolve_config().and_then(|config| {
        let blobs = config.blob_store();
        with_store(config, |store| {
            CollectionService::<_, T>::new(store)
                .publish_with_file(&blobs, record, &file)
                .map_err(|err| err.to_string())
        })
    });

    match result {
        Ok(entry) => ActionResponse::success(message, entry.id),
        Err(err) => ActionResponse::failure(op, err),
    }
}

fn save_record<T: StudyRecord>(op: &'static str, id: Option<String>, record: T) -> ActionResponse {
    let target = match id.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => match parse_document_id(raw) {
            Ok(id) => Some(id),
            Err(err) => return ActionResponse::failure(op, err),
        },
        None => None,
    };

    let result = resolve_config().and_then(|config| {
        with_store(config, |store| {
            let service = CollectionService::<_, T>::new(store);
            let saved = match target {
                Some(id) => service.update(id, &record),
                None => service.create(&record),
            };
            saved.map_err(|err| err.to_string())
        })
    });

    match (result, target) {
        (Ok(entry), Some(_)) => ActionResponse::success("Record updated.", entry.id),
        (Ok(entry), None) => ActionResponse::success("Record created.", entry.id),
        (Err(err), _) => ActionResponse::failure(op, err),
    }
}

fn normalize_recent_limit(limit: Option<u32>, configured: usize) -> u32 {
    let fallback = u32::try_from(configured)
        .unwrap_or(DASHBOARD_RECENT_MAX)
        .min(DASHBOARD_RECENT_MAX);
    match limit {
        Some(0) | None => fallback,
        Some(value) if value > DASHBOARD_RECENT_MAX => DASHBOARD_RECENT_MAX,
        Some(value) => value,
    }
}

fn resolve_config() -> Result<&'static CoreConfig, String> {
    ENTRY_CONFIG
        .get_or_init(|| CoreConfig::from_env().map_err(|err| err.to_string()))
        .as_ref()
        .map_err(Clone::clone)
}

fn with_store<R>(
    config: &CoreConfig,
    f: impl FnOnce(&SqliteDocumentStore<'_>) -> Result<R, String>,
) -> Result<R, String> {
    let conn = open_db(&config.db_path).map_err(|err| format!("DB open failed: {err}"))?;
    let store =
        SqliteDocumentStore::try_new(&conn).map_err(|err| format!("store init failed: {err}"))?;
    f(&store)
}

fn parse_collection(raw: &str) -> Result<Collection, String> {
    Collection::parse(raw).ok_or_else(|| format!("unknown collection `{}`", raw.trim()))
}

fn parse_document_id(raw: &str) -> Result<DocumentId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid record id `{}`", raw.trim()))
}

fn to_feed_item(item: UploadItem) -> UploadFeedItem {
    UploadFeedItem {
        id: item.id.to_string(),
        name: item.name,
        kind: item.kind.label().to_string(),
        created_at_ms: item.created_at,
    }
}

fn list_entries<T: StudyRecord>(
    store: &SqliteDocumentStore<'_>,
) -> Result<Vec<RecordListItem>, String> {
    CollectionService::<_, T>::new(store)
        .list()
        .map_err(|err| err.to_string())?
        .iter()
        .map(to_list_item::<T>)
        .collect()
}

fn to_list_item<T: StudyRecord>(entry: &RecordEntry<T>) -> Result<RecordListItem, String> {
    let fields = entry
        .record
        .to_fields()
        .map_err(|err| format!("{}/{} does not encode: {err}", T::COLLECTION, entry.id))?
        .into_iter()
        .map(|(key, value)| RecordField {
            key,
            value: value
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
        })
        .collect();

    Ok(RecordListItem {
        id: entry.id.to_string(),
        name: entry.record.display_name().to_string(),
        created_at_ms: entry.created_at,
        fields,
    })
}
