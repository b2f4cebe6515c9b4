//! Typed records for each managed collection.
//!
//! # Responsibility
//! - Map collection documents to typed structs with wire-compatible names.
//! - Declare required fields per record and check them before writes.
//!
//! # Invariants
//! - A record is valid when every required field is non-blank after trim.
//! - Missing optional fields decode to empty strings.

use crate::model::document::{Collection, Fields};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Required-field validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    MissingField {
        collection: Collection,
        field: &'static str,
    },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { collection, field } => {
                write!(f, "{collection}: required field `{field}` is missing")
            }
        }
    }
}

impl Error for RecordValidationError {}

/// Shared behavior of every typed collection record.
pub trait StudyRecord: Serialize + DeserializeOwned + Clone {
    /// Collection the record lives in.
    const COLLECTION: Collection;

    /// `(wire field name, value)` pairs that must be non-blank.
    fn required_fields(&self) -> Vec<(&'static str, &str)>;

    /// Name shown in lists and the uploads feed.
    fn display_name(&self) -> &str;

    /// Checks required fields in declaration order.
    fn validate(&self) -> Result<(), RecordValidationError> {
        match self
            .required_fields()
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
        {
            Some((field, _)) => Err(RecordValidationError::MissingField {
                collection: Self::COLLECTION,
                field,
            }),
            None => Ok(()),
        }
    }

    /// Serializes the record into top-level document fields.
    fn to_fields(&self) -> serde_json::Result<Fields> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            _ => Err(serde::ser::Error::custom("record did not serialize to an object")),
        }
    }

    /// Decodes a record from stored document fields.
    fn from_fields(fields: &Fields) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(fields.clone()))
    }
}

/// Records whose main payload is an uploaded file.
pub trait FileBackedRecord: StudyRecord {
    fn file_url(&self) -> &str;
    fn set_file_url(&mut self, url: String);

    /// Required fields excluding the file reference.
    ///
    /// Checked before an upload starts, since the URL only exists afterwards.
    fn validate_before_upload(&self) -> Result<(), RecordValidationError> {
        let mut candidate = self.clone();
        if candidate.file_url().trim().is_empty() {
            candidate.set_file_url("pending".to_string());
        }
        candidate.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Book {
    pub title: String,
    pub semester: String,
    pub subject: String,
    pub file_url: String,
}

impl StudyRecord for Book {
    const COLLECTION: Collection = Collection::Books;

    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("title", self.title.as_str()),
            ("semester", self.semester.as_str()),
            ("subject", self.subject.as_str()),
            ("fileUrl", self.file_url.as_str()),
        ]
    }

    fn display_name(&self) -> &str {
        &self.title
    }
}

impl FileBackedRecord for Book {
    fn file_url(&self) -> &str {
        &self.file_url
    }

    fn set_file_url(&mut self, url: String) {
        self.file_url = url;
    }
}

/// Lecture note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Note {
    pub title: String,
    pub semester: String,
    pub subject: String,
    pub lecture_no: String,
    pub file_url: String,
}

impl StudyRecord for Note {
    const COLLECTION: Collection = Collection::Notes;

    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("title", self.title.as_str()),
            ("semester", self.semester.as_str()),
            ("subject", self.subject.as_str()),
            ("lectureNo", self.lecture_no.as_str()),
            ("fileUrl", self.file_url.as_str()),
        ]
    }

    fn display_name(&self) -> &str {
        &self.title
    }
}

impl FileBackedRecord for Note {
    fn file_url(&self) -> &str {
        &self.file_url
    }

    fn set_file_url(&mut self, url: String) {
        self.file_url = url;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Assignment {
    pub title: String,
    pub subject: String,
    /// Free-form display date as typed by the admin.
    pub due_date: String,
    pub description: String,
}

impl StudyRecord for Assignment {
    const COLLECTION: Collection = Collection::Assignments;

    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("title", self.title.as_str()),
            ("subject", self.subject.as_str()),
            ("dueDate", self.due_date.as_str()),
        ]
    }

    fn display_name(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notice {
    pub title: String,
    /// Stored as `desc` in existing notice documents.
    #[serde(rename = "desc")]
    pub description: String,
    /// Display date shown on the notice card.
    pub date: String,
}

impl StudyRecord for Notice {
    const COLLECTION: Collection = Collection::Notices;

    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("title", self.title.as_str()),
            ("desc", self.description.as_str()),
            ("date", self.date.as_str()),
        ]
    }

    fn display_name(&self) -> &str {
        &self.title
    }
}

/// One row of the exam routine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamEntry {
    pub subject: String,
    pub date: String,
    pub time: String,
    pub semester: String,
    pub room: String,
}

impl StudyRecord for ExamEntry {
    const COLLECTION: Collection = Collection::Exams;

    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("subject", self.subject.as_str()),
            ("date", self.date.as_str()),
            ("time", self.time.as_str()),
            ("semester", self.semester.as_str()),
        ]
    }

    fn display_name(&self) -> &str {
        &self.subject
    }
}
