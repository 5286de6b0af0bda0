use crate::api::GenerationBackend;
use crate::error::{Result, ScriptError};
use crate::model::{ScriptFragment, Style, TargetDuration};
use crate::prompt::{build_prompt, response_schema};
use crate::{logi, logw};
use std::sync::Arc;

pub const GENERATION_FAILED: &str = "無法從AI服務獲取腳本。請檢查您的API金鑰或稍後再試。";

/// Turns (topic, duration, style) into a validated script fragment with one
/// backend round trip.
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// The topic is expected to be non-blank; the session checks that.
    pub async fn generate(
        &self,
        topic: &str,
        duration: TargetDuration,
        style: Style,
    ) -> Result<ScriptFragment> {
        let prompt = build_prompt(topic, duration, style);
        let schema = response_schema();

        logi(format!(
            "Requesting {} {} script from {}",
            duration,
            style,
            self.backend.name()
        ));

        let text = self
            .backend
            .generate_json(&prompt, &schema)
            .await
            .map_err(|e| {
                logw(format!("Generation call failed: {e:#}"));
                ScriptError::Generation(GENERATION_FAILED.to_string())
            })?;

        let fragment = ScriptFragment::from_json(&text).map_err(|e| {
            logw(format!("Generation response rejected: {e}"));
            ScriptError::Generation(format!("{GENERATION_FAILED}（{e}）"))
        })?;

        logi(format!(
            "Received {} script with {} scenes ({}s)",
            fragment.video_type,
            fragment.scenes.len(),
            fragment.scenes.iter().map(|s| s.seconds).sum::<u32>()
        ));
        Ok(fragment)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use crate::api::GenerationBackend;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    pub const COFFEE_RESPONSE: &str = r#"{"videoType":"廣告","scenes":[{"scene":1,
        "storyboard":"特寫咖啡壺注水","voiceover":"每一滴，都是講究。",
        "imagePrompt":"close-up of a pour-over kettle","characterPrompt":"N/A",
        "veoPrompt":"slow motion pour","seconds":30,"music":"溫暖的鋼琴"}]}"#;

    /// Backend answering with canned text and remembering every prompt.
    pub struct FakeBackend {
        reply: std::result::Result<String, String>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        pub fn last_prompt(&self) -> Option<String> {
            self.prompts.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl GenerationBackend for FakeBackend {
        fn name(&self) -> &str {
            "fake"
        }

        async fn generate_json(&self, prompt: &str, _schema: &Value) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(|e| anyhow!(e))
        }
    }
}
