//! triagestream
//!
//! Wires the pipeline stages into a runnable tool: configuration, the
//! per-batch triage controller, the ingestion loop and CLI commands.

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod render;
pub mod simulate;
pub mod watch;

pub use config::{AppConfig, VoiceConfig};
pub use pipeline::{requires_escalation, BatchOutcome, BatchReport, Timed, TriageController};
pub use watch::{watch, WatchEnd, WatchSettings};
