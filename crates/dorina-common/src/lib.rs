//! doRiNA Common Library
//!
//! Shared types, logging and error handling for the webdorina workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`DorinaError`] and the crate [`Result`] alias
//! - **Logging**: tracing subscriber setup shared by the server and worker binaries
//! - **Types**: the analysis result row stored in the result cache, including
//!   the sentinel rows and the adapters for line-oriented engine output
//!
//! # Example
//!
//! ```no_run
//! use dorina_common::types::ResultRow;
//!
//! fn first_gene(line: &str) -> dorina_common::Result<String> {
//!     let row = ResultRow::from_tab_line(line)?;
//!     Ok(row.gene)
//! }
//! ```
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{DorinaError, Result};
