//! Command handlers for the TechMate CLI.

pub mod ask;
pub mod cache;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use cache::CacheCommand;
