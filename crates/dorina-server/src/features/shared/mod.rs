//! Shared utilities and types for feature modules
//!
//! - **pagination**: offset paging over stored result lists
//! - **test_helpers**: in-memory feature state for route tests (test-only)

pub mod pagination;

#[cfg(test)]
pub mod test_helpers;

pub use pagination::{OffsetPage, OffsetParams};
