// Inventory API Library
//
// Provides the HTTP/JSON REST API for the DevOps inventory

pub mod http;

// Re-export commonly used types
pub use http::{create_router, AppState};
