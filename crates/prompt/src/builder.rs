//! Prompt builder for rendering templates.

use crate::template::{PLAN_SYSTEM_PROMPT, PLAN_TEMPLATE};
use crate::types::BuiltPrompt;
use handlebars::Handlebars;
use std::collections::HashMap;
use techmate_core::{AppError, AppResult};

/// Render a Handlebars template with variables.
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

/// Build the plan-synthesis prompt.
///
/// # Arguments
/// * `schema` - Pretty-printed JSON schema of the expected output
/// * `user_context` - Pretty-printed JSON of the user's device context
/// * `snippets` - Pretty-printed JSON of the retrieved web snippets
pub fn build_plan_prompt(
    schema: &str,
    user_context: &str,
    snippets: &str,
) -> AppResult<BuiltPrompt> {
    tracing::debug!(
        schema_len = schema.len(),
        context_len = user_context.len(),
        snippets_len = snippets.len(),
        "Building plan-synthesis prompt"
    );

    let mut variables = HashMap::new();
    variables.insert("schema".to_string(), schema.to_string());
    variables.insert("userContext".to_string(), user_context.to_string());
    variables.insert("snippets".to_string(), snippets.to_string());

    let user = render_template(PLAN_TEMPLATE, &variables)?;

    Ok(BuiltPrompt::new(Some(PLAN_SYSTEM_PROMPT.to_string()), user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template_substitutes_variables() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "world".to_string());

        let rendered = render_template("hello {{name}}", &vars).unwrap();
        assert_eq!(rendered, "hello world");
    }

    #[test]
    fn test_render_template_does_not_escape() {
        let mut vars = HashMap::new();
        vars.insert("json".to_string(), "{\"a\": \"<b>\"}".to_string());

        let rendered = render_template("{{{json}}}", &vars).unwrap();
        assert_eq!(rendered, "{\"a\": \"<b>\"}");
    }

    #[test]
    fn test_build_plan_prompt_embeds_all_sections() {
        let built =
            build_plan_prompt("{\"type\": \"object\"}", "{\"os\": \"Linux\"}", "[]").unwrap();

        assert!(built.system.as_deref().unwrap().contains("TechMate"));
        assert!(built.user.contains("{\"type\": \"object\"}"));
        assert!(built.user.contains("{\"os\": \"Linux\"}"));
        assert!(built.user.contains("Output ONLY valid JSON."));
    }
}
