//! Database-backed test suite.
//!
//! Drives analysis ingestion, pattern caching and global insight generation
//! against PostgreSQL with a scripted analysis provider.
//! Requires a running PostgreSQL database (DATABASE_URL, RUST_ENV=development).
//!
//! Run with: cargo test --features test-support --test db_e2e

mod test_helpers;

mod test_analysis_lifecycle;
mod test_insight_storage;
mod test_job_triggers;
