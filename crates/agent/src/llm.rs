use anyhow::Result;
use async_trait::async_trait;

/// One generation request to the external suggestion source.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub system: String,
    /// Ask the model for strict JSON output.
    pub json_mode: bool,
    pub temperature: f32,
}

impl GenerateRequest {
    pub fn json(prompt: impl Into<String>, system: impl Into<String>, temperature: f32) -> Self {
        Self { prompt: prompt.into(), system: system.into(), json_mode: true, temperature }
    }
}

/// Seam to the external AI collaborator. Implementations may be unreachable
/// at any time; callers must treat `Err` as a degraded-but-expected outcome,
/// not a fault to propagate.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String>;
}
