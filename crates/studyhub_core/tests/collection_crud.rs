use rusqlite::params;
use std::cell::RefCell;
use studyhub_core::db::open_db_in_memory;
use studyhub_core::{
    Assignment, AssignmentService, BlobError, BlobResult, BlobStore, Book, BookService,
    Collection, DocumentStore, ExamEntry, ExamService, FileUpload, FsBlobStore, Note,
    NoteService, Notice, NoticeService, RecordValidationError, RepoError, ServiceError,
    SqliteDocumentStore,
};
use uuid::Uuid;

/// Blob store double recording uploads and optionally failing them.
#[derive(Default)]
struct RecordingBlobStore {
    fail: bool,
    uploads: RefCell<Vec<(String, usize)>>,
}

impl BlobStore for RecordingBlobStore {
    fn upload_blob(&self, bytes: &[u8], path: &str) -> BlobResult<String> {
        if self.fail {
            return Err(BlobError::Io {
                path: path.into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "bucket unavailable"),
            });
        }
        self.uploads
            .borrow_mut()
            .push((path.to_string(), bytes.len()));
        Ok(format!("https://files.example.com/{path}"))
    }
}

fn assignment(title: &str) -> Assignment {
    Assignment {
        title: title.to_string(),
        subject: "CSE 221".to_string(),
        due_date: "14 Feb 2026".to_string(),
        description: "Submit on the portal".to_string(),
    }
}

fn draft_book() -> Book {
    Book {
        title: "Discrete Mathematics".to_string(),
        semester: "2nd".to_string(),
        subject: "MAT 102".to_string(),
        file_url: String::new(),
    }
}

#[test]
fn create_update_delete_assignment_flow() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = AssignmentService::new(&store);

    let created = service.create(&assignment("Lab 3")).unwrap();
    assert_eq!(created.record.title, "Lab 3");

    let mut edited = created.record.clone();
    edited.due_date = "21 Feb 2026".to_string();
    let updated = service.update(created.id, &edited).unwrap();
    assert_eq!(updated.record.due_date, "21 Feb 2026");
    assert_eq!(updated.created_at, created.created_at);

    service.delete(created.id).unwrap();
    assert!(service.get(created.id).unwrap().is_none());
    assert!(matches!(
        service.delete(created.id),
        Err(ServiceError::NotFound { collection: Collection::Assignments, .. })
    ));
}

#[test]
fn missing_required_field_blocks_create_and_update() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = NoticeService::new(&store);

    let incomplete = Notice {
        title: "Exam Update".to_string(),
        description: String::new(),
        date: "3 Mar".to_string(),
    };
    let err = service.create(&incomplete).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(RecordValidationError::MissingField { field: "desc", .. })
    ));
    assert_eq!(store.count_documents(Collection::Notices).unwrap(), 0);

    let valid = Notice {
        description: "Midterm moved to Monday".to_string(),
        ..incomplete.clone()
    };
    let created = service.create(&valid).unwrap();
    let blanked = Notice {
        title: "  ".to_string(),
        ..valid
    };
    assert!(matches!(
        service.update(created.id, &blanked),
        Err(ServiceError::Validation(_))
    ));
    let stored = service.get(created.id).unwrap().unwrap();
    assert_eq!(stored.record.title, "Exam Update");
}

#[test]
fn update_missing_record_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = ExamService::new(&store);

    let exam = ExamEntry {
        subject: "Operating Systems".to_string(),
        date: "20 Jan 2026".to_string(),
        time: "10:00 AM".to_string(),
        semester: "5th".to_string(),
        room: String::new(),
    };
    let missing = Uuid::new_v4();
    assert!(matches!(
        service.update(missing, &exam),
        Err(ServiceError::NotFound { id, .. }) if id == missing
    ));
}

#[test]
fn list_is_sorted_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = AssignmentService::new(&store);

    let old = service.create(&assignment("old")).unwrap();
    let new = service.create(&assignment("new")).unwrap();
    let mid = service.create(&assignment("mid")).unwrap();
    for (entry, created_at) in [(&old, 1_000), (&new, 3_000), (&mid, 2_000)] {
        conn.execute(
            "UPDATE documents SET created_at = ?1 WHERE id = ?2;",
            params![created_at, entry.id.to_string()],
        )
        .unwrap();
    }

    let titles = service
        .list()
        .unwrap()
        .into_iter()
        .map(|entry| entry.record.title)
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["new", "mid", "old"]);
    assert_eq!(service.count().unwrap(), 3);
}

#[test]
fn list_reports_records_that_do_not_decode() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = AssignmentService::new(&store);
    service.create(&assignment("fine")).unwrap();
    conn.execute(
        "INSERT INTO documents (id, collection, fields, created_at, updated_at)
         VALUES (?1, 'assignments', '{\"title\": [1, 2]}', 0, 0);",
        [Uuid::new_v4().to_string()],
    )
    .unwrap();

    let err = service.list().unwrap_err();
    assert!(matches!(err, ServiceError::Repo(RepoError::InvalidData(_))));
}

#[test]
fn publish_with_file_uploads_then_stores_public_url() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = BookService::new(&store);
    let blobs = RecordingBlobStore::default();

    let file = FileUpload::new("Discrete Math Ch 1.pdf", b"%PDF-1.7 body".to_vec());
    let published = service.publish_with_file(&blobs, draft_book(), &file).unwrap();

    assert_eq!(
        published.record.file_url,
        "https://files.example.com/books/Discrete_Math_Ch_1.pdf"
    );
    assert_eq!(
        blobs.uploads.borrow().as_slice(),
        &[("books/Discrete_Math_Ch_1.pdf".to_string(), 13)]
    );
    let stored = service.get(published.id).unwrap().unwrap();
    assert_eq!(stored.record, published.record);
}

#[test]
fn failed_upload_writes_no_document() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = NoteService::new(&store);
    let blobs = RecordingBlobStore {
        fail: true,
        ..RecordingBlobStore::default()
    };

    let note = Note {
        title: "Algorithm Analysis".to_string(),
        semester: "3rd".to_string(),
        subject: "CSE".to_string(),
        lecture_no: "05".to_string(),
        file_url: String::new(),
    };
    let err = service
        .publish_with_file(&blobs, note, &FileUpload::new("lecture5.pdf", vec![1, 2, 3]))
        .unwrap_err();

    assert!(matches!(err, ServiceError::Blob(_)));
    assert_eq!(store.count_documents(Collection::Notes).unwrap(), 0);
}

#[test]
fn publish_rejects_missing_fields_and_bad_files_before_uploading() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = BookService::new(&store);
    let blobs = RecordingBlobStore::default();
    let pdf = FileUpload::new("book.pdf", vec![1]);

    let untitled = Book {
        title: String::new(),
        ..draft_book()
    };
    assert!(matches!(
        service.publish_with_file(&blobs, untitled, &pdf),
        Err(ServiceError::Validation(_))
    ));

    let docx = FileUpload::new("book.docx", vec![1]);
    assert!(matches!(
        service.publish_with_file(&blobs, draft_book(), &docx),
        Err(ServiceError::InvalidFile(_))
    ));

    assert!(blobs.uploads.borrow().is_empty());
    assert_eq!(store.count_documents(Collection::Books).unwrap(), 0);
}

#[test]
fn publish_with_filesystem_blob_store_writes_file() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = BookService::new(&store);
    let blob_dir = tempfile::tempdir().unwrap();
    let blobs = FsBlobStore::new(blob_dir.path(), None);

    let file = FileUpload::new("My Book.pdf", b"%PDF".to_vec());
    let published = service.publish_with_file(&blobs, draft_book(), &file).unwrap();

    let written = blob_dir.path().join("books").join("My_Book.pdf");
    assert_eq!(std::fs::read(&written).unwrap(), b"%PDF");
    assert!(published.record.file_url.starts_with("file://"));
    assert!(published.record.file_url.ends_with("books/My_Book.pdf"));
}
