//! Unified "recent uploads" feed.
//!
//! # Responsibility
//! - Tag items from books, notes, assignments and notices with their source.
//! - Sort the merged set newest-first.
//! - Filter by name and truncate to the N most recent for summary views.
//!
//! # Invariants
//! - Output is ordered by `created_at DESC`; ties keep input order, with
//!   collections in feed order (book, note, assignment, notice).
//! - Filtering never mutates the retained set; clearing restores it.
//! - Truncation yields a prefix of the unfiltered sorted sequence.

use crate::model::document::{Collection, DocumentId, StoredDocument};
use serde::{Deserialize, Serialize};

/// Source collection of one feed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    Book,
    Note,
    Assignment,
    Notice,
}

impl UploadKind {
    /// Collection order used to break timestamp ties.
    pub const FEED_ORDER: [UploadKind; 4] = [
        UploadKind::Book,
        UploadKind::Note,
        UploadKind::Assignment,
        UploadKind::Notice,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Book => "Book",
            Self::Note => "Note",
            Self::Assignment => "Assignment",
            Self::Notice => "Notice",
        }
    }

    pub fn collection(self) -> Collection {
        match self {
            Self::Book => Collection::Books,
            Self::Note => Collection::Notes,
            Self::Assignment => Collection::Assignments,
            Self::Notice => Collection::Notices,
        }
    }

    /// Returns `None` for collections that do not feed uploads (exams).
    pub fn from_collection(collection: Collection) -> Option<Self> {
        match collection {
            Collection::Books => Some(Self::Book),
            Collection::Notes => Some(Self::Note),
            Collection::Assignments => Some(Self::Assignment),
            Collection::Notices => Some(Self::Notice),
            Collection::Exams => None,
        }
    }
}

/// One entry of the uploads feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadItem {
    pub id: DocumentId,
    pub name: String,
    pub kind: UploadKind,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl UploadItem {
    pub fn from_document(kind: UploadKind, document: &StoredDocument) -> Self {
        Self {
            id: document.id,
            name: document.display_name().to_string(),
            kind,
            created_at: document.created_at,
        }
    }
}

/// Merges pre-tagged groups into one newest-first sequence.
///
/// The sort is stable, so equal timestamps keep group order, then the order
/// within each group.
pub fn merge_uploads<G>(groups: G) -> Vec<UploadItem>
where
    G: IntoIterator,
    G::Item: IntoIterator<Item = UploadItem>,
{
    let mut items = groups.into_iter().flatten().collect::<Vec<_>>();
    items.sort_by(|left, right| right.created_at.cmp(&left.created_at));
    items
}

/// Builds the uploads feed from the four source collections.
pub fn aggregate_uploads(
    books: &[StoredDocument],
    notes: &[StoredDocument],
    assignments: &[StoredDocument],
    notices: &[StoredDocument],
) -> Vec<UploadItem> {
    let sources = [books, notes, assignments, notices];
    merge_uploads(
        UploadKind::FEED_ORDER
            .into_iter()
            .zip(sources)
            .map(|(kind, documents)| {
                documents
                    .iter()
                    .map(move |document| UploadItem::from_document(kind, document))
            }),
    )
}

/// Keeps items whose name contains `query`, ignoring case.
///
/// The query is matched verbatim, whitespace included. Only an empty query
/// keeps everything.
pub fn filter_uploads(items: &[UploadItem], query: &str) -> Vec<UploadItem> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }

    items
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Returns the first `limit` items of an already sorted feed.
pub fn top_recent(items: &[UploadItem], limit: usize) -> Vec<UploadItem> {
    items.iter().take(limit).cloned().collect()
}

/// Search-screen state: the retained feed plus the current filter view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadsFeed {
    all: Vec<UploadItem>,
    query: String,
    visible: Vec<UploadItem>,
}

impl UploadsFeed {
    /// Creates a feed with no active filter.
    ///
    /// Items are (re)sorted newest-first, so unsorted input is accepted.
    pub fn new(items: Vec<UploadItem>) -> Self {
        let all = merge_uploads([items]);
        Self {
            visible: all.clone(),
            all,
            query: String::new(),
        }
    }

    /// Applies `query` to the retained set and returns the filtered view.
    pub fn set_query(&mut self, query: impl Into<String>) -> &[UploadItem] {
        self.query = query.into();
        self.visible = filter_uploads(&self.all, &self.query);
        &self.visible
    }

    pub fn clear_query(&mut self) -> &[UploadItem] {
        self.set_query(String::new())
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Items matching the current query.
    pub fn visible(&self) -> &[UploadItem] {
        &self.visible
    }

    /// Full retained set, regardless of the query.
    pub fn all(&self) -> &[UploadItem] {
        &self.all
    }

    /// The `limit` most recent items, ignoring the query.
    pub fn recent(&self, limit: usize) -> Vec<UploadItem> {
        top_recent(&self.all, limit)
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        aggregate_uploads, filter_uploads, merge_uploads, top_recent, UploadItem, UploadKind,
        UploadsFeed,
    };
    use crate::model::document::{Collection, StoredDocument};
    use serde_json::json;
    use uuid::Uuid;

    fn doc(collection: Collection, title: &str, created_at: i64) -> StoredDocument {
        StoredDocument {
            id: Uuid::new_v4(),
            collection,
            fields: json!({ "title": title }).as_object().cloned().unwrap(),
            created_at,
        }
    }

    fn item(kind: UploadKind, name: &str, created_at: i64) -> UploadItem {
        UploadItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind,
            created_at,
        }
    }

    fn names(items: &[UploadItem]) -> Vec<&str> {
        items.iter().map(|item| item.name.as_str()).collect()
    }

    /// Deterministic pseudo-random timestamps with frequent collisions.
    fn generated_groups(seed: u64) -> Vec<Vec<UploadItem>> {
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            state >> 33
        };
        UploadKind::FEED_ORDER
            .into_iter()
            .map(|kind| {
                let len = (next() % 7) as usize;
                (0..len)
                    .map(|index| item(kind, &format!("{}-{index}", kind.label()), (next() % 5) as i64))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn example_feed_sorts_newest_first_and_filters_case_insensitively() {
        let books = [doc(Collection::Books, "Algebra", 3)];
        let notes = [doc(Collection::Notes, "Algebra Notes", 5)];
        let notices = [doc(Collection::Notices, "Exam Update", 1)];

        let feed = aggregate_uploads(&books, &notes, &[], &notices);
        assert_eq!(names(&feed), vec!["Algebra Notes", "Algebra", "Exam Update"]);
        assert_eq!(
            feed.iter().map(|item| item.kind).collect::<Vec<_>>(),
            vec![UploadKind::Note, UploadKind::Book, UploadKind::Notice]
        );

        let filtered = filter_uploads(&feed, "algebra");
        assert_eq!(names(&filtered), vec!["Algebra Notes", "Algebra"]);
    }

    #[test]
    fn empty_input_yields_empty_feed() {
        assert!(aggregate_uploads(&[], &[], &[], &[]).is_empty());
        assert!(UploadsFeed::new(Vec::new()).is_empty());
    }

    #[test]
    fn merged_length_equals_sum_and_order_is_non_increasing() {
        for seed in 0..64 {
            let groups = generated_groups(seed);
            let expected_len = groups.iter().map(Vec::len).sum::<usize>();
            let merged = merge_uploads(groups);

            assert_eq!(merged.len(), expected_len, "seed {seed}");
            assert!(
                merged
                    .windows(2)
                    .all(|pair| pair[0].created_at >= pair[1].created_at),
                "seed {seed}"
            );
        }
    }

    #[test]
    fn ties_keep_collection_then_input_order() {
        let merged = merge_uploads(vec![
            vec![item(UploadKind::Book, "b1", 7), item(UploadKind::Book, "b2", 7)],
            vec![item(UploadKind::Note, "n1", 7)],
            vec![],
            vec![item(UploadKind::Notice, "x1", 9), item(UploadKind::Notice, "x2", 7)],
        ]);
        assert_eq!(names(&merged), vec!["x1", "b1", "b2", "n1", "x2"]);
    }

    #[test]
    fn filter_with_unique_substring_returns_exactly_that_item() {
        for seed in 0..32 {
            let merged = merge_uploads(generated_groups(seed));
            for target in &merged {
                let filtered = filter_uploads(&merged, &target.name.to_uppercase());
                assert_eq!(filtered, vec![target.clone()], "seed {seed}");
            }
        }
    }

    #[test]
    fn truncation_is_prefix_of_unfiltered_sequence() {
        for seed in 0..32 {
            let merged = merge_uploads(generated_groups(seed));
            for limit in 0..=merged.len() + 1 {
                let top = top_recent(&merged, limit);
                assert_eq!(top.len(), limit.min(merged.len()));
                assert_eq!(top.as_slice(), &merged[..top.len()]);
            }
        }
    }

    #[test]
    fn feed_filtering_is_non_destructive() {
        let mut feed = UploadsFeed::new(vec![
            item(UploadKind::Book, "Algebra", 3),
            item(UploadKind::Note, "Algebra Notes", 5),
            item(UploadKind::Notice, "Exam Update", 1),
        ]);
        let full = feed.all().to_vec();

        assert_eq!(names(feed.set_query("EXAM")), vec!["Exam Update"]);
        assert_eq!(feed.query(), "EXAM");
        assert_eq!(feed.all(), full.as_slice());
        assert_eq!(names(&feed.recent(2)), vec!["Algebra Notes", "Algebra"]);

        assert!(feed.set_query("zzz").is_empty());
        assert_eq!(feed.clear_query(), full.as_slice());
        assert_eq!(feed.visible(), full.as_slice());
    }

    #[test]
    fn empty_query_keeps_everything() {
        let items = vec![item(UploadKind::Assignment, "Lab", 1)];
        assert_eq!(filter_uploads(&items, ""), items);
    }

    #[test]
    fn query_whitespace_is_part_of_the_match() {
        let items = vec![
            item(UploadKind::Note, "Algebra Notes", 5),
            item(UploadKind::Book, "Algebra", 3),
        ];

        assert_eq!(names(&filter_uploads(&items, "algebra ")), vec!["Algebra Notes"]);
        assert_eq!(names(&filter_uploads(&items, " ")), vec!["Algebra Notes"]);
        assert!(filter_uploads(&items, "  ").is_empty());
    }

    #[test]
    fn kind_maps_to_collection_and_back() {
        for kind in UploadKind::FEED_ORDER {
            assert_eq!(UploadKind::from_collection(kind.collection()), Some(kind));
        }
        assert_eq!(UploadKind::from_collection(Collection::Exams), None);
    }
}
