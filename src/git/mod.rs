pub mod backend;
pub mod credentials;
pub mod error;
pub mod operations;
pub mod repository;
pub mod status;
pub mod updater;

// Public API - curated exports only
pub mod api;

// Re-export commonly used items
pub use api::*;
