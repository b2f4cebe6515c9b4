//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store and blob calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod collection_service;
pub mod dashboard_service;

use crate::model::record::{Assignment, Book, ExamEntry, Note, Notice};
use collection_service::CollectionService;

pub type BookService<S> = CollectionService<S, Book>;
pub type NoteService<S> = CollectionService<S, Note>;
pub type AssignmentService<S> = CollectionService<S, Assignment>;
pub type NoticeService<S> = CollectionService<S, Notice>;
pub type ExamService<S> = CollectionService<S, ExamEntry>;
