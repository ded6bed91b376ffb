//! Structured troubleshooting-plan model.
//!
//! This is the output contract for plan synthesis: the generation service is
//! asked for strictly schema-conformant JSON, which is deserialized into
//! these types and then validated. Parse or validation failures surface as
//! `AppError::SchemaValidation`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use techmate_core::{AppError, AppResult};

/// Operating system a step targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetOs {
    Windows,
    #[serde(rename = "macOS")]
    MacOs,
    Linux,
    #[default]
    Any,
}

impl TargetOs {
    /// Parse an OS name from user input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "windows" => Some(Self::Windows),
            "macos" | "mac" | "darwin" => Some(Self::MacOs),
            "linux" => Some(Self::Linux),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    /// Get the canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::MacOs => "macOS",
            Self::Linux => "Linux",
            Self::Any => "Any",
        }
    }
}

/// A single troubleshooting step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Step identifier (e.g., "S1")
    pub id: String,

    /// Short step title
    pub title: String,

    /// Why this step is worth trying
    pub rationale: String,

    /// What the user should do
    pub action: String,

    /// OS the step applies to
    #[serde(default)]
    pub target_os: TargetOs,

    /// Shell commands to run, in order (may be empty)
    #[serde(default)]
    pub commands: Vec<String>,

    /// Expected outcome when the step succeeds
    pub expect: String,

    /// Id of the step to try next when this one fails.
    /// Advisory: not structurally enforced against `steps`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_fails_next: Option<String>,
}

/// A complete structured troubleshooting plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TroubleshootingPlan {
    /// One-paragraph restatement of the issue
    pub issue_summary: String,

    /// Probable root causes, most likely first
    pub likely_causes: Vec<String>,

    /// High-level outline of the plan
    pub plan_overview: Vec<String>,

    /// Ordered troubleshooting steps
    pub steps: Vec<Step>,

    /// Fast checks to run before the full plan
    #[serde(default)]
    pub quick_checks: Vec<String>,

    /// Diagnostics worth collecting for escalation
    #[serde(default)]
    pub diagnostics_to_collect: Vec<String>,

    /// How to tell the issue is resolved
    #[serde(default)]
    pub resolution_criteria: Vec<String>,

    /// When to stop self-service and escalate
    #[serde(default)]
    pub escalation_criteria: Vec<String>,

    /// Warnings about risky actions
    #[serde(default)]
    pub safety_notes: Vec<String>,

    /// Source URLs consulted
    #[serde(default)]
    pub sources: Vec<String>,

    /// Assumptions the plan rests on
    #[serde(default)]
    pub assumptions: Vec<String>,

    /// Model confidence in [0, 1]
    pub confidence: f64,
}

impl TroubleshootingPlan {
    /// Strictly parse a generation-service response into a validated plan.
    pub fn from_json_str(s: &str) -> AppResult<Self> {
        let plan: Self = serde_json::from_str(s.trim()).map_err(|e| {
            AppError::SchemaValidation(format!("response did not match plan schema: {}", e))
        })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Validate field constraints serde cannot express.
    ///
    /// `confidence` must lie in [0, 1]. Dangling `if_fails_next` references
    /// are logged but accepted; the field is advisory.
    pub fn validate(&self) -> AppResult<()> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(AppError::SchemaValidation(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }

        let ids: HashSet<&str> = self.steps.iter().map(|s| s.id.as_str()).collect();
        for step in &self.steps {
            if let Some(next) = &step.if_fails_next {
                if !ids.contains(next.as_str()) {
                    tracing::warn!(
                        "step '{}' points at unknown fallback step '{}'",
                        step.id,
                        next
                    );
                }
            }
        }

        Ok(())
    }

    /// JSON schema for the plan, embedded into the synthesis prompt so the
    /// model can self-validate structurally.
    pub fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "issue_summary": { "type": "string" },
                "likely_causes": { "type": "array", "items": { "type": "string" } },
                "plan_overview": { "type": "array", "items": { "type": "string" } },
                "steps": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "title": { "type": "string" },
                            "rationale": { "type": "string" },
                            "action": { "type": "string" },
                            "target_os": {
                                "type": "string",
                                "enum": ["Windows", "macOS", "Linux", "Any"],
                                "default": "Any"
                            },
                            "commands": { "type": "array", "items": { "type": "string" } },
                            "expect": { "type": "string" },
                            "if_fails_next": { "type": ["string", "null"] }
                        },
                        "required": ["id", "title", "rationale", "action", "expect"]
                    }
                },
                "quick_checks": { "type": "array", "items": { "type": "string" } },
                "diagnostics_to_collect": { "type": "array", "items": { "type": "string" } },
                "resolution_criteria": { "type": "array", "items": { "type": "string" } },
                "escalation_criteria": { "type": "array", "items": { "type": "string" } },
                "safety_notes": { "type": "array", "items": { "type": "string" } },
                "sources": { "type": "array", "items": { "type": "string" } },
                "assumptions": { "type": "array", "items": { "type": "string" } },
                "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
            },
            "required": [
                "issue_summary",
                "likely_causes",
                "plan_overview",
                "steps",
                "confidence"
            ]
        })
    }
}
