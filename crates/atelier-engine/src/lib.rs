pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod fanout;
pub mod orchestrator;
pub mod prompts;
pub mod transport;

pub use client::{GenerativeClient, GenerativeService};
pub use config::EngineConfig;
pub use error::{AnalysisError, FailureKind, FlowError, GenerationError, PreconditionError};
pub use orchestrator::{DictationStatus, Orchestrator, ProcessOutcome, RegenerateOutcome};
pub use transport::{GeminiTransport, ModelTransport};
