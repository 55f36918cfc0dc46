//! Catalog Backend Library
//!
//! This library exposes modules for testing and external use.
//! The main binary is in `src/main.rs`.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
/// Application state management
///
/// Holds the catalog document store, the upload directory, and the
/// single-writer lock serializing document mutations.
pub mod state;
