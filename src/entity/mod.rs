//! SeaORM entity definitions for PostgreSQL database.

pub mod performance;
pub mod school;
