//! Plan synthesis.
//!
//! Turns (user context, retrieved snippets) into a validated
//! `TroubleshootingPlan` by asking the generation service for strictly
//! schema-conformant JSON at low temperature.

use crate::context::{RetrievedSnippet, TicketContext};
use std::sync::Arc;
use techmate_core::AppResult;
use techmate_llm::{LlmClient, LlmRequest, TroubleshootingPlan};
use techmate_prompt::build_plan_prompt;

/// Low sampling temperature to favor deterministic, factual plans.
const SYNTH_TEMPERATURE: f32 = 0.3;

/// Composes the synthesis request and validates the model's response.
///
/// Does not touch the query cache; parse and validation failures surface as
/// `AppError::SchemaValidation` and are not retried here.
pub struct PlanSynthesizer {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl PlanSynthesizer {
    /// Create a synthesizer for the given client and model.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Synthesize a validated plan from context and snippets.
    pub async fn synthesize(
        &self,
        ctx: &TicketContext,
        snippets: &[RetrievedSnippet],
    ) -> AppResult<TroubleshootingPlan> {
        tracing::info!(
            snippets = snippets.len(),
            model = %self.model,
            "Synthesizing troubleshooting plan"
        );

        let schema = serde_json::to_string_pretty(&TroubleshootingPlan::json_schema())?;
        let user_context = serde_json::to_string_pretty(&ctx.payload())?;
        let snippets_json = serde_json::to_string_pretty(snippets)?;

        let built = build_plan_prompt(&schema, &user_context, &snippets_json)?;

        let mut request = LlmRequest::new(built.user, &self.model)
            .with_temperature(SYNTH_TEMPERATURE)
            .with_json_output();
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = self.client.complete(&request).await?;

        TroubleshootingPlan::from_json_str(&response.content)
    }
}
