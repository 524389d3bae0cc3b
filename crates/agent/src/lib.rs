pub mod gemini;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod router;

pub use gemini::GeminiClient;
pub use llm::{GenerateRequest, LlmClient};
pub use orchestrator::{CommandOutcome, SuggestionAgent};
pub use router::{CommandContext, IntentRouter, RoutedCommand};
