//! Versioned state repository integration tests.

mod delete;
mod listing;
