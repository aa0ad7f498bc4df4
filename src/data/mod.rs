//! Speech tables, party metadata and row filters.

pub mod embedded;
pub mod filters;
pub mod parties;
pub mod speeches;
