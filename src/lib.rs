//! PawHaven data core
//!
//! Pet listings, adoption workflow, shelter operations and their analytics,
//! persisted as JSON collections in an async key-value store.

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod matching;
pub mod models;
pub mod platform;
pub mod repository;
pub mod services;
pub mod stats;
pub mod store;

pub use platform::{Dashboard, Platform};
