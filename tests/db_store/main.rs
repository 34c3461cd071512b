//! PostgreSQL record store test suite.
//!
//! Exercises `DbPool` as a `RecordStore`: per-file transactions, batched
//! inserts and `import_id` deduplication. Requires a running PostgreSQL
//! reachable through DATABASE_URL (the development default works), so every
//! test is ignored unless asked for.
//!
//! Run with: cargo test --test db_store -- --ignored

mod test_helpers;

mod test_idempotent_inserts;
