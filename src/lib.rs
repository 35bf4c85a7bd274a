// Doctor Rank - review ratings, doctor ranking and comment votes

// Domain types
pub mod models;

// Rating aggregation and ranking
pub mod ranking;

// Comment vote ledger
pub mod votes;

// Persistence, identity and request plumbing
pub mod infrastructure;

// Application services and HTTP surface
pub mod services;
pub mod api;
pub mod app_state;

// Common utilities
pub mod config;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
