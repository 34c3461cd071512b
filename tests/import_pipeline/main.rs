//! Import pipeline test suite.
//!
//! Drives the upload session and the HTTP import API against an in-memory
//! record store; no database is needed.
//!
//! Run with: cargo test --test import_pipeline

mod test_helpers;

mod test_api_imports;
mod test_session_flow;
