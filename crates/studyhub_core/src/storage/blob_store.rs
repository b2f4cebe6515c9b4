//! Blob store contract and filesystem implementation.
//!
//! # Invariants
//! - Blob paths are relative, `/`-separated and never escape the store root.
//! - Uploading to an existing path overwrites it.
//! - The returned URL is the only handle callers keep.

use crate::model::document::Collection;
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s").expect("valid ws regex"));

pub type BlobResult<T> = Result<T, BlobError>;

#[derive(Debug)]
pub enum BlobError {
    /// Path is empty, absolute or contains `.`/`..` segments.
    InvalidPath(String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for BlobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(path) => write!(f, "invalid blob path `{path}`"),
            Self::Io { path, source } => {
                write!(f, "blob io failed at `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for BlobError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPath(_) => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Object storage used for uploaded PDFs.
pub trait BlobStore {
    /// Stores `bytes` at `path` and returns a URL that serves them.
    fn upload_blob(&self, bytes: &[u8], path: &str) -> BlobResult<String>;
}

impl<S: BlobStore + ?Sized> BlobStore for &S {
    fn upload_blob(&self, bytes: &[u8], path: &str) -> BlobResult<String> {
        (**self).upload_blob(bytes, path)
    }
}

/// Blob store writing into a local directory tree.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl FsBlobStore {
    /// Creates a store rooted at `root`.
    ///
    /// With `public_base_url`, returned URLs are `{base}/{path}`; otherwise
    /// they are `file://` URLs of the written file.
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url
                .map(|base| base.trim().trim_end_matches('/').to_string())
                .filter(|base| !base.is_empty()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a blob path to its location under the store root.
    pub fn resolve(&self, path: &str) -> BlobResult<PathBuf> {
        let segments = validate_blob_path(path)?;
        let mut target = self.root.clone();
        target.extend(segments);
        Ok(target)
    }

    fn public_url(&self, path: &str, target: &Path) -> String {
        match self.public_base_url.as_deref() {
            Some(base) => format!("{base}/{path}"),
            None => {
                let absolute = std::fs::canonicalize(target).unwrap_or_else(|_| target.to_path_buf());
                format!("file://{}", absolute.display())
            }
        }
    }
}

impl BlobStore for FsBlobStore {
    fn upload_blob(&self, bytes: &[u8], path: &str) -> BlobResult<String> {
        let started_at = Instant::now();
        let target = self.resolve(path)?;

        let write_result = target
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::write(&target, bytes));
        if let Err(source) = write_result {
            error!(
                "event=blob_upload module=storage status=error bytes={} duration_ms={} error={source}",
                bytes.len(),
                started_at.elapsed().as_millis()
            );
            return Err(BlobError::Io {
                path: target,
                source,
            });
        }

        info!(
            "event=blob_upload module=storage status=ok bytes={} duration_ms={}",
            bytes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(self.public_url(path, &target))
    }
}

/// Replaces every whitespace character in a file name with `_`.
pub fn safe_file_name(file_name: &str) -> String {
    WHITESPACE_RE.replace_all(file_name, "_").into_owned()
}

/// Blob path for a file uploaded into `collection`.
pub fn blob_path(collection: Collection, file_name: &str) -> String {
    format!("{}/{}", collection.as_str(), safe_file_name(file_name))
}

fn validate_blob_path(path: &str) -> BlobResult<Vec<&str>> {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(BlobError::InvalidPath(path.to_string()));
    }

    let segments = path.split('/').collect::<Vec<_>>();
    if segments
        .iter()
        .any(|segment| segment.is_empty() || *segment == "." || *segment == "..")
    {
        return Err(BlobError::InvalidPath(path.to_string()));
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::{blob_path, safe_file_name, validate_blob_path, FsBlobStore};
    use crate::model::document::Collection;

    #[test]
    fn safe_file_name_replaces_each_whitespace_char() {
        assert_eq!(safe_file_name("Data Structure\tCh 1.pdf"), "Data_Structure_Ch_1.pdf");
        assert_eq!(safe_file_name("plain.pdf"), "plain.pdf");
    }

    #[test]
    fn blob_path_is_prefixed_with_collection_folder() {
        assert_eq!(blob_path(Collection::Books, "My Book.pdf"), "books/My_Book.pdf");
    }

    #[test]
    fn validate_blob_path_rejects_traversal_and_absolute_paths() {
        assert!(validate_blob_path("").is_err());
        assert!(validate_blob_path("/etc/passwd").is_err());
        assert!(validate_blob_path("books/../secret").is_err());
        assert!(validate_blob_path("books//a.pdf").is_err());
        assert!(validate_blob_path("books\\a.pdf").is_err());
        assert_eq!(validate_blob_path("books/a.pdf").unwrap(), vec!["books", "a.pdf"]);
    }

    #[test]
    fn new_normalizes_public_base_url() {
        let store = FsBlobStore::new("/tmp/blobs", Some(" https://cdn.example.com/ ".to_string()));
        let target = store.resolve("books/a.pdf").unwrap();
        assert_eq!(
            store.public_url("books/a.pdf", &target),
            "https://cdn.example.com/books/a.pdf"
        );

        let blank = FsBlobStore::new("/tmp/blobs", Some("   ".to_string()));
        assert!(blank.public_base_url.is_none());
    }
}
