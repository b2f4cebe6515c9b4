//! Flutter bridge entry points for the StudyHub admin console.

pub mod api;
