//! Collection use-case service.
//!
//! # Responsibility
//! - Provide create/update/delete/get/list for one typed collection.
//! - Enforce required fields before any write.
//! - Publish file-backed records (books, notes) by uploading first.
//!
//! # Invariants
//! - A record failing validation never reaches the store.
//! - `publish_with_file` writes no document when the upload fails.
//! - `list` is sorted by `created_at DESC`, stable on ties.

use crate::model::document::{Collection, DocumentId, StoredDocument};
use crate::model::record::{FileBackedRecord, RecordValidationError, StudyRecord};
use crate::repo::document_repo::{DocumentStore, RepoError};
use crate::storage::blob_store::{blob_path, BlobError, BlobStore};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for collection use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// A required form field is blank.
    Validation(RecordValidationError),
    /// Target document does not exist.
    NotFound {
        collection: Collection,
        id: DocumentId,
    },
    /// Uploaded file was rejected before reaching the blob store.
    InvalidFile(String),
    Repo(RepoError),
    Blob(BlobError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => write!(f, "not found: {collection}/{id}"),
            Self::InvalidFile(message) => write!(f, "invalid file: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Blob(err) => write!(f, "upload failed: {err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent store state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Blob(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { collection, id } => Self::NotFound { collection, id },
            other => Self::Repo(other),
        }
    }
}

impl From<RecordValidationError> for ServiceError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<BlobError> for ServiceError {
    fn from(value: BlobError) -> Self {
        Self::Blob(value)
    }
}

/// A typed record together with its store metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry<T> {
    pub id: DocumentId,
    pub record: T,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// File picked by the admin for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Accepts non-empty PDF files only.
    pub fn validate(&self) -> ServiceResult<()> {
        let name = self.file_name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidFile("file name is empty".to_string()));
        }
        if !name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(ServiceError::InvalidFile(format!(
                "`{name}` is not a PDF document"
            )));
        }
        if self.bytes.is_empty() {
            return Err(ServiceError::InvalidFile(format!("`{name}` is empty")));
        }
        Ok(())
    }
}

/// CRUD service for one typed collection over any document store.
pub struct CollectionService<S: DocumentStore, T: StudyRecord> {
    store: S,
    _record: PhantomData<fn() -> T>,
}

impl<S: DocumentStore, T: StudyRecord> CollectionService<S, T> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Validates and writes a new record, returning the stored entry.
    pub fn create(&self, record: &T) -> ServiceResult<RecordEntry<T>> {
        self.check(record, "create")?;
        let fields = record
            .to_fields()
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        let id = self.store.create_document(T::COLLECTION, &fields)?;
        info!(
            "event=record_create module=service status=ok collection={}",
            T::COLLECTION
        );

        self.get(id)?.ok_or(ServiceError::InconsistentState(
            "created record not found in read-back",
        ))
    }

    /// Validates and merges `record` into an existing document.
    pub fn update(&self, id: DocumentId, record: &T) -> ServiceResult<RecordEntry<T>> {
        self.check(record, "update")?;
        let fields = record
            .to_fields()
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        self.store.update_document(T::COLLECTION, id, &fields)?;
        info!(
            "event=record_update module=service status=ok collection={}",
            T::COLLECTION
        );

        self.get(id)?.ok_or(ServiceError::InconsistentState(
            "updated record not found in read-back",
        ))
    }

    /// Deletes one record permanently.
    pub fn delete(&self, id: DocumentId) -> ServiceResult<()> {
        self.store.delete_document(T::COLLECTION, id)?;
        info!(
            "event=record_delete module=service status=ok collection={}",
            T::COLLECTION
        );
        Ok(())
    }

    pub fn get(&self, id: DocumentId) -> ServiceResult<Option<RecordEntry<T>>> {
        self.store
            .get_document(T::COLLECTION, id)?
            .map(|document| decode_entry::<T>(&document))
            .transpose()
    }

    /// Lists all records, newest first.
    pub fn list(&self) -> ServiceResult<Vec<RecordEntry<T>>> {
        let mut entries = self
            .store
            .list_documents(T::COLLECTION)?
            .iter()
            .map(decode_entry::<T>)
            .collect::<ServiceResult<Vec<_>>>()?;
        entries.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(entries)
    }

    pub fn count(&self) -> ServiceResult<u64> {
        Ok(self.store.count_documents(T::COLLECTION)?)
    }

    fn check(&self, record: &T, action: &'static str) -> ServiceResult<()> {
        record.validate().map_err(|err| {
            warn!(
                "event=record_{action} module=service status=rejected collection={} error_code=missing_field",
                T::COLLECTION
            );
            ServiceError::from(err)
        })
    }
}

impl<S: DocumentStore, T: FileBackedRecord> CollectionService<S, T> {
    /// Uploads `file` and creates the record pointing at it.
    ///
    /// # Contract
    /// - Text fields and the file are checked before anything is uploaded.
    /// - The blob lands at `{collection}/{file name with whitespace as _}`.
    /// - The returned URL replaces `record`'s file reference.
    pub fn publish_with_file<B: BlobStore>(
        &self,
        blobs: &B,
        mut record: T,
        file: &FileUpload,
    ) -> ServiceResult<RecordEntry<T>> {
        record.validate_before_upload()?;
        file.validate()?;

        let path = blob_path(T::COLLECTION, file.file_name.trim());
        let url = blobs.upload_blob(&file.bytes, &path).map_err(|err| {
            warn!(
                "event=record_publish module=service status=error collection={} error_code=upload_failed",
                T::COLLECTION
            );
            err
        })?;

        record.set_file_url(url);
        self.create(&record)
    }
}

fn decode_entry<T: StudyRecord>(document: &StoredDocument) -> ServiceResult<RecordEntry<T>> {
    let record = T::from_fields(&document.fields).map_err(|err| {
        RepoError::InvalidData(format!(
            "{}/{} does not decode: {err}",
            document.collection, document.id
        ))
    })?;
    Ok(RecordEntry {
        id: document.id,
        record,
        created_at: document.created_at,
    })
}
