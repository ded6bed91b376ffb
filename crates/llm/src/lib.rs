//! LLM integration crate for the TechMate assistant.
//!
//! This crate provides a provider-agnostic abstraction for interacting with
//! Large Language Models (LLMs), plus the structured troubleshooting-plan
//! model the generation service is asked to emit.
//!
//! # Providers
//! - **Gemini**: hosted structured-output generation (default)
//! - **Ollama**: local LLM runtime
//!
//! # Example
//! ```no_run
//! use techmate_llm::{LlmClient, LlmRequest, providers::GeminiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::new("api-key");
//! let request = LlmRequest::new("Hello, world!", "gemini-1.5-flash");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod plan;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use plan::{Step, TargetOs, TroubleshootingPlan};
pub use providers::{GeminiClient, OllamaClient};
