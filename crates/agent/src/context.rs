//! User context and retrieved-snippet types.

use serde::Serialize;
use techmate_llm::TargetOs;

/// Constraint applied when the user states none.
pub const DEFAULT_CONSTRAINT: &str = "Prefer safe, built-in solutions first";

/// Provenance marker attached to retrieved snippets. Per-chunk page URLs
/// are not preserved through the index, so all snippets share this tag.
pub const SNIPPET_SOURCE: &str = "web-search";

/// Everything the user told us about their problem and device.
#[derive(Debug, Clone)]
pub struct TicketContext {
    /// Free-text problem description; also the cache key
    pub query: String,

    /// Device label (e.g., "Dell XPS 13")
    pub device: String,

    /// Operating system the user runs
    pub os: TargetOs,

    /// Observed symptoms
    pub symptoms: Vec<String>,

    /// Constraints on acceptable fixes
    pub constraints: Vec<String>,
}

impl TicketContext {
    /// Create a context for `query` with default device settings.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            device: "Windows laptop".to_string(),
            os: TargetOs::Windows,
            symptoms: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Set the device label.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Set the operating system.
    pub fn with_os(mut self, os: TargetOs) -> Self {
        self.os = os;
        self
    }

    /// Set the observed symptoms.
    pub fn with_symptoms(mut self, symptoms: Vec<String>) -> Self {
        self.symptoms = symptoms;
        self
    }

    /// Set the fix constraints.
    pub fn with_constraints(mut self, constraints: Vec<String>) -> Self {
        self.constraints = constraints;
        self
    }

    /// JSON payload embedded into the synthesis prompt.
    ///
    /// An empty constraint list is replaced by [`DEFAULT_CONSTRAINT`].
    pub fn payload(&self) -> serde_json::Value {
        let constraints = if self.constraints.is_empty() {
            vec![DEFAULT_CONSTRAINT.to_string()]
        } else {
            self.constraints.clone()
        };

        serde_json::json!({
            "query": self.query,
            "device": self.device,
            "os": self.os.as_str(),
            "symptoms": self.symptoms,
            "constraints": constraints,
        })
    }
}

/// A retrieved chunk paired with its provenance tag, as handed to the plan
/// synthesizer.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedSnippet {
    /// Provenance tag (see [`SNIPPET_SOURCE`])
    pub source: String,

    /// The chunk text
    pub excerpt: String,
}

impl RetrievedSnippet {
    /// Wrap a retrieved chunk with the generic provenance marker.
    pub fn from_chunk(excerpt: String) -> Self {
        Self {
            source: SNIPPET_SOURCE.to_string(),
            excerpt,
        }
    }
}
