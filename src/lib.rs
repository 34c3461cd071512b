//! School Insights server library.
//!
//! This library provides the CSV import pipeline behind the dashboard:
//! parsing, schema validation, record mapping, school reference resolution
//! and batch persistence, plus the HTTP surface that exposes it.

pub mod api;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
