//! Prompt system for the TechMate assistant.
//!
//! Renders the plan-synthesis prompt: a fixed system persona plus a user
//! template that embeds the output JSON schema, the user's device context,
//! and the retrieved web snippets.

pub mod builder;
pub mod template;
pub mod types;

pub use builder::{build_plan_prompt, render_template};
pub use template::{PLAN_SYSTEM_PROMPT, PLAN_TEMPLATE};
pub use types::BuiltPrompt;
