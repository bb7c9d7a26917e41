//! Shelf application library
//!
//! An in-memory bookshelf served over HTTP, built from the shelf kernel,
//! telemetry and HTTP crates.

pub mod modules;

/// Re-export commonly used types
pub use modules::books::{
    models::{Book, BookFields, BookFilter, BookSummary, Flag},
    store::{BookStore, BookStoreError},
};
pub use modules::register_all;
