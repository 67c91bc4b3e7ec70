// Re-export needed modules for testing
pub mod chat;    // Store, reducer and transport seam
pub mod config;
pub mod error;
pub mod models;
pub mod view;    // Snapshot helpers for the terminal UI

// Re-export main types for convenience
pub use chat::{ChatState, ChatStore, SendOutcome};
pub use error::ChatError;
pub use models::*;
