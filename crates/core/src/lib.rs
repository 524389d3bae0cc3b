pub mod config;
pub mod document;
pub mod engine;
pub mod errors;
pub mod intent;
pub mod patch;
pub mod suggestion;
pub mod telemetry;
pub mod versioning;

pub use config::{AppConfig, ConfigError, HistoryConfig, LlmConfig, LoggingConfig};
pub use document::{Block, BlockId, Dimensions, Document, DocumentId};
pub use engine::EditEngine;
pub use errors::DomainError;
pub use intent::{EditIntent, Locale};
pub use patch::{BlockSpec, Operation, Patch, PatchId, PatchOp};
pub use suggestion::{Suggestion, SuggestionId};
pub use telemetry::{SuggestionTelemetry, TelemetryReport};
pub use versioning::{DocumentVersion, VersionStore, VersionSummary, DEFAULT_RETENTION_CAP};
