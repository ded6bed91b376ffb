//! Ask command handler.
//!
//! Wires the configured collaborators into an `Agent` and prints the
//! resulting troubleshooting plan.

use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use techmate_agent::{Agent, AgentOptions, PageFetcher, PlanSynthesizer, SerpApiClient, TicketContext};
use techmate_core::{config::AppConfig, AppError, AppResult};
use techmate_knowledge::{create_provider, EmbeddingConfig, QueryCache};
use techmate_llm::{create_client, TargetOs, TroubleshootingPlan};

/// Ask for a troubleshooting plan
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Free-text description of the issue
    pub query: String,

    /// Device label (e.g., "Dell XPS 13")
    #[arg(long, default_value = "Windows laptop")]
    pub device: String,

    /// Operating system (Windows, macOS, Linux)
    #[arg(long, default_value = "Windows")]
    pub os: String,

    /// Observed symptom (repeatable)
    #[arg(long = "symptom")]
    pub symptoms: Vec<String>,

    /// Constraint on acceptable fixes (repeatable)
    #[arg(long = "constraint")]
    pub constraints: Vec<String>,

    /// Abort the pipeline after this many seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Output the raw plan as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        config.validate()?;

        let os = TargetOs::parse(&self.os).ok_or_else(|| {
            AppError::Config(format!(
                "Unknown OS '{}'. Supported: Windows, macOS, Linux, Any",
                self.os
            ))
        })?;

        let agent = self.build_agent(config)?;

        let ctx = TicketContext::new(&self.query)
            .with_device(&self.device)
            .with_os(os)
            .with_symptoms(self.symptoms.clone())
            .with_constraints(self.constraints.clone());

        let plan = agent.submit(&ctx).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            print_plan(&plan);
        }

        Ok(())
    }

    /// Assemble the agent from configuration.
    fn build_agent(&self, config: &AppConfig) -> AppResult<Agent> {
        // validate() ran already; the key is present.
        let serpapi_key = config
            .serpapi_api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("Missing SERPAPI_API_KEY in environment.".to_string()))?;

        let search = match &config.search_endpoint {
            Some(endpoint) => SerpApiClient::with_endpoint(serpapi_key, endpoint),
            None => SerpApiClient::new(serpapi_key),
        };

        let fetcher = PageFetcher::new(config.page_char_budget)?;

        let embedder = create_provider(&EmbeddingConfig {
            provider: config.embedding_provider.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
            endpoint: None,
        })?;

        let llm = create_client(
            &config.provider,
            config.llm_endpoint.as_deref(),
            config.gemini_api_key.as_deref(),
        )?;
        let synthesizer = PlanSynthesizer::new(llm, &config.model);

        let options = AgentOptions {
            search_results: config.search_results,
            top_k: config.top_k,
            chunk_size: config.chunk_size,
            deadline: self
                .deadline_secs
                .or(config.deadline_secs)
                .map(Duration::from_secs),
        };

        Ok(Agent::new(
            Arc::new(search),
            Arc::new(fetcher),
            embedder,
            synthesizer,
            QueryCache::new(config.cache_path()),
            options,
        ))
    }
}

/// Print a plan as human-readable sections.
fn print_plan(plan: &TroubleshootingPlan) {
    println!("Issue Summary");
    println!("  {}", plan.issue_summary);

    print_list("Likely Causes", &plan.likely_causes);
    print_list("Plan Overview", &plan.plan_overview);
    print_list("Quick Checks", &plan.quick_checks);

    if !plan.steps.is_empty() {
        println!("\nTroubleshooting Steps");
        for step in &plan.steps {
            println!("  [{}] {} ({})", step.id, step.title, step.target_os.as_str());
            println!("    Rationale: {}", step.rationale);
            println!("    Action: {}", step.action);
            for command in &step.commands {
                println!("      $ {}", command);
            }
            println!("    Expect: {}", step.expect);
            if let Some(next) = &step.if_fails_next {
                println!("    If this fails, go to: {}", next);
            }
        }
    }

    print_list("Diagnostics to Collect", &plan.diagnostics_to_collect);
    print_list("Resolution Criteria", &plan.resolution_criteria);
    print_list("Escalation Criteria", &plan.escalation_criteria);
    print_list("Safety Notes", &plan.safety_notes);
    print_list("Sources", &plan.sources);
    print_list("Assumptions", &plan.assumptions);

    println!("\nConfidence: {:.0}%", plan.confidence * 100.0);
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n{}", title);
    for item in items {
        println!("  - {}", item);
    }
}
