pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use gemini::GeminiBackend;

/// A remote text generator that answers with a JSON document conforming to
/// `schema`. One call is one round trip; implementations do not retry.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the provider's raw text output.
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String>;
}
