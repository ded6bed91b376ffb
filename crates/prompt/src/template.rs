//! Built-in prompt templates.

/// System persona for plan synthesis.
pub const PLAN_SYSTEM_PROMPT: &str = "You are TechMate, an agentic virtual tech support \
assistant. Help users resolve any tech issue safely and step-by-step. Produce structured \
JSON exactly matching the requested schema. Include OS/device-specific commands, cite \
sources, and note assumptions. If unsure or steps fail, propose alternatives or escalate. \
Never suggest risky actions without explicit confirmation.";

/// User template for plan synthesis.
///
/// Variables: `schema`, `userContext`, `snippets` — each a pretty-printed
/// JSON string. Triple braces keep Handlebars from escaping them.
pub const PLAN_TEMPLATE: &str = "\
Generate a **full troubleshooting plan** for the user's issue. \
The output must be a single JSON object matching the schema exactly.

JSON Schema:
{{{schema}}}

User context:
{{{userContext}}}

Web snippets:
{{{snippets}}}

Output ONLY valid JSON.";
