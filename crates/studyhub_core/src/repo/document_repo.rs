//! Document store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide list/get/create/update/delete over named collections.
//! - Stamp `created_at` on create; callers never supply it.
//!
//! # Invariants
//! - `list_documents` returns documents in insertion order.
//! - `update_document` merges top-level fields; keys not in the patch stay.
//! - Deletes are hard deletes.
//! - Read paths reject malformed persisted rows instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::document::{Collection, DocumentId, Fields, StoredDocument};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const DOCUMENT_SELECT_SQL: &str = "SELECT
    id,
    collection,
    fields,
    created_at
FROM documents";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for document store operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound {
        collection: Collection,
        id: DocumentId,
    },
    InvalidData(String),
    /// Connection was not opened through `db::open_db*`.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => {
                write!(f, "document not found: {collection}/{id}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted document data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Operations the admin console needs from a document database.
pub trait DocumentStore {
    fn list_documents(&self, collection: Collection) -> RepoResult<Vec<StoredDocument>>;
    fn get_document(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> RepoResult<Option<StoredDocument>>;
    fn create_document(&self, collection: Collection, fields: &Fields) -> RepoResult<DocumentId>;
    fn update_document(
        &self,
        collection: Collection,
        id: DocumentId,
        fields: &Fields,
    ) -> RepoResult<()>;
    fn delete_document(&self, collection: Collection, id: DocumentId) -> RepoResult<()>;
    fn count_documents(&self, collection: Collection) -> RepoResult<u64>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn list_documents(&self, collection: Collection) -> RepoResult<Vec<StoredDocument>> {
        (**self).list_documents(collection)
    }

    fn get_document(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> RepoResult<Option<StoredDocument>> {
        (**self).get_document(collection, id)
    }

    fn create_document(&self, collection: Collection, fields: &Fields) -> RepoResult<DocumentId> {
        (**self).create_document(collection, fields)
    }

    fn update_document(
        &self,
        collection: Collection,
        id: DocumentId,
        fields: &Fields,
    ) -> RepoResult<()> {
        (**self).update_document(collection, id, fields)
    }

    fn delete_document(&self, collection: Collection, id: DocumentId) -> RepoResult<()> {
        (**self).delete_document(collection, id)
    }

    fn count_documents(&self, collection: Collection) -> RepoResult<u64> {
        (**self).count_documents(collection)
    }
}

/// SQLite-backed document store.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Wraps a connection returned by `db::open_db*`.
    ///
    /// # Errors
    /// - [`RepoError::UninitializedConnection`] when migrations are not at the
    ///   latest version.
    /// - [`RepoError::MissingRequiredTable`] when `documents` is absent.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let has_documents: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'documents'
            );",
            [],
            |row| row.get(0),
        )?;
        if !has_documents {
            return Err(RepoError::MissingRequiredTable("documents"));
        }

        Ok(Self { conn })
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn list_documents(&self, collection: Collection) -> RepoResult<Vec<StoredDocument>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DOCUMENT_SELECT_SQL}
             WHERE collection = ?1
             ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([collection.as_str()])?;
        let mut documents = Vec::new();

        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }

        Ok(documents)
    }

    fn get_document(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> RepoResult<Option<StoredDocument>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DOCUMENT_SELECT_SQL}
             WHERE collection = ?1
               AND id = ?2;"
        ))?;

        let mut rows = stmt.query(params![collection.as_str(), id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_document_row(row)?));
        }

        Ok(None)
    }

    fn create_document(&self, collection: Collection, fields: &Fields) -> RepoResult<DocumentId> {
        let id = Uuid::new_v4();
        let now = now_epoch_ms();

        self.conn.execute(
            "INSERT INTO documents (
                id,
                collection,
                fields,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?4);",
            params![
                id.to_string(),
                collection.as_str(),
                encode_fields(fields)?,
                now
            ],
        )?;

        debug!(
            "event=doc_create module=repo status=ok collection={collection} field_count={}",
            fields.len()
        );
        Ok(id)
    }

    fn update_document(
        &self,
        collection: Collection,
        id: DocumentId,
        fields: &Fields,
    ) -> RepoResult<()> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT fields FROM documents WHERE collection = ?1 AND id = ?2;",
                params![collection.as_str(), id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(existing) = existing else {
            return Err(RepoError::NotFound { collection, id });
        };

        let mut merged = decode_fields(&existing)?;
        for (key, value) in fields {
            merged.insert(key.clone(), value.clone());
        }

        self.conn.execute(
            "UPDATE documents
             SET
                fields = ?1,
                updated_at = ?2
             WHERE collection = ?3
               AND id = ?4;",
            params![
                encode_fields(&merged)?,
                now_epoch_ms(),
                collection.as_str(),
                id.to_string()
            ],
        )?;

        debug!(
            "event=doc_update module=repo status=ok collection={collection} field_count={}",
            fields.len()
        );
        Ok(())
    }

    fn delete_document(&self, collection: Collection, id: DocumentId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
            params![collection.as_str(), id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound { collection, id });
        }

        debug!("event=doc_delete module=repo status=ok collection={collection}");
        Ok(())
    }

    fn count_documents(&self, collection: Collection) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1;",
            [collection.as_str()],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative document count `{count}`")))
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn parse_document_row(row: &Row<'_>) -> RepoResult<StoredDocument> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid id value `{id_text}` in documents.id"))
    })?;

    let collection_text: String = row.get("collection")?;
    let collection = Collection::parse(&collection_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid collection `{collection_text}` in documents.collection"
        ))
    })?;

    let fields_text: String = row.get("fields")?;
    let fields = decode_fields(&fields_text)?;

    Ok(StoredDocument {
        id,
        collection,
        fields,
        created_at: row.get("created_at")?,
    })
}

fn encode_fields(fields: &Fields) -> RepoResult<String> {
    serde_json::to_string(fields)
        .map_err(|err| RepoError::InvalidData(format!("unencodable fields: {err}")))
}

fn decode_fields(raw: &str) -> RepoResult<Fields> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(RepoError::InvalidData(
            "documents.fields is not a JSON object".to_string(),
        )),
        Err(err) => Err(RepoError::InvalidData(format!(
            "documents.fields is not valid JSON: {err}"
        ))),
    }
}
