//! triagestream classifiers
//!
//! External reasoning collaborators for the triage pipeline.
//!
//! Two tiers are modeled:
//! - [`Classifier`]: fast severity triage of every digest
//! - [`DeepAnalyzer`]: root-cause analysis, invoked only on escalation
//!
//! [`GeminiClient`] implements both over the Gemini HTTP API.

pub mod classifier;
pub mod gemini;
pub mod response;

pub use classifier::{Classifier, Completion, DeepAnalyzer};
pub use gemini::{GeminiClient, GeminiConfig};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{Classifier, Completion, DeepAnalyzer};
    pub use crate::gemini::{GeminiClient, GeminiConfig};
}
