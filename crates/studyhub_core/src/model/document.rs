//! Raw document shape as persisted by the document store.
//!
//! # Invariants
//! - `fields` is always a JSON object.
//! - `created_at` is stamped by the store, never by callers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-generated identifier of one document.
pub type DocumentId = Uuid;

/// Top-level document fields, keyed by wire (camelCase) name.
pub type Fields = Map<String, Value>;

/// Collections managed by the admin console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Books,
    Notes,
    Assignments,
    Notices,
    /// Exam routine entries. Not part of the uploads feed.
    Exams,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Books,
        Collection::Notes,
        Collection::Assignments,
        Collection::Notices,
        Collection::Exams,
    ];

    /// Store-level collection name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Books => "books",
            Self::Notes => "notes",
            Self::Assignments => "assignments",
            Self::Notices => "notices",
            Self::Exams => "exams",
        }
    }

    /// Parses a collection name, ignoring case and surrounding whitespace.
    ///
    /// Singular forms (`book`, `exam`, ...) are accepted as well.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "books" | "book" => Some(Self::Books),
            "notes" | "note" => Some(Self::Notes),
            "assignments" | "assignment" => Some(Self::Assignments),
            "notices" | "notice" => Some(Self::Notices),
            "exams" | "exam" => Some(Self::Exams),
            _ => None,
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One document as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub collection: Collection,
    pub fields: Fields,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl StoredDocument {
    /// Returns a string field, or `None` when missing or not a string.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Human-facing name: `title`, falling back to `name`.
    ///
    /// Only missing or empty values fall through; a whitespace-only title is
    /// still a title. Returns `""` when neither is usable.
    pub fn display_name(&self) -> &str {
        ["title", "name"]
            .into_iter()
            .filter_map(|key| self.field_str(key))
            .find(|value| !value.is_empty())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::{Collection, StoredDocument};
    use serde_json::json;
    use uuid::Uuid;

    fn doc_with(fields: serde_json::Value) -> StoredDocument {
        StoredDocument {
            id: Uuid::new_v4(),
            collection: Collection::Books,
            fields: fields.as_object().cloned().unwrap(),
            created_at: 0,
        }
    }

    #[test]
    fn collection_parse_accepts_singular_and_mixed_case() {
        assert_eq!(Collection::parse(" Books "), Some(Collection::Books));
        assert_eq!(Collection::parse("exam"), Some(Collection::Exams));
        assert_eq!(Collection::parse("routine"), None);
    }

    #[test]
    fn collection_names_round_trip_through_parse() {
        for collection in Collection::ALL {
            assert_eq!(Collection::parse(collection.as_str()), Some(collection));
        }
    }

    #[test]
    fn display_name_prefers_title_then_name() {
        assert_eq!(doc_with(json!({"title": "Algebra", "name": "x"})).display_name(), "Algebra");
        assert_eq!(doc_with(json!({"title": "", "name": "Fallback"})).display_name(), "Fallback");
        assert_eq!(doc_with(json!({"title": 12})).display_name(), "");
    }

    #[test]
    fn display_name_keeps_whitespace_only_title() {
        let document = doc_with(json!({"title": "  ", "name": "Fallback"}));
        assert_eq!(document.display_name(), "  ");
    }
}
