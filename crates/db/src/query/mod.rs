//! Hand-written SQL for the listing endpoints, and the folds rebuilding
//! graphs from their flattened rows.

pub mod comment;
pub mod joins;
pub mod row;
pub mod run_query;
pub mod sort;
pub mod video;

pub use row::SqlRow;
pub use run_query::{BuiltQuery, Replacements, run_query};
