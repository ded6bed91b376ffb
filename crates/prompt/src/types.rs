//! Prompt types for the TechMate assistant.

use serde::{Deserialize, Serialize};

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,
}

impl BuiltPrompt {
    /// Create a new built prompt.
    pub fn new(system: Option<String>, user: String) -> Self {
        Self { system, user }
    }
}
