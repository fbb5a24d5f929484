use async_trait::async_trait;

use crate::error::AppResult;

/// Text-generation backend: prompt in, completion out.
///
/// Implementations must sample deterministically (temperature 0) and are shared
/// across concurrently running ticket pipelines.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> AppResult<String>;
}
