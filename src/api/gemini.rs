use super::GenerationBackend;
use crate::config::Config;
use crate::{logi, logw};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

const RAW_SNIPPET_CHARS: usize = 800;

pub struct GeminiBackend {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
    top_p: f32,
}

impl GeminiBackend {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self::with_client(client, cfg))
    }

    pub fn with_client(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            api_key: cfg.api_key.clone(),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            top_p: cfg.top_p,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model)
    }

    fn request_body(&self, prompt: &str, schema: &Value) -> Value {
        json!({
            "contents": [
                {"role": "user", "parts": [{"text": prompt}]}
            ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
                "temperature": self.temperature,
                "topP": self.top_p,
            },
        })
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String> {
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt, schema))
            .send()
            .await
            .context("Gemini request failed")?;

        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            logw(format!("Gemini HTTP {}", status.as_u16()));
            log_raw_snippet(&raw);
            log_error_envelope(&raw);
            bail!("Gemini returned HTTP {}", status.as_u16());
        }

        match extract_output_text(&raw) {
            Some(text) => {
                logi(format!("Gemini ({}) answered with {} bytes", self.model, text.len()));
                Ok(text)
            }
            None => {
                logw("Gemini response parse failed.");
                log_raw_snippet(&raw);
                bail!("Gemini response carried no text output")
            }
        }
    }
}

fn log_raw_snippet(raw: &str) {
    if !raw.is_empty() {
        let snippet = raw.chars().take(RAW_SNIPPET_CHARS).collect::<String>();
        logw(format!("Gemini raw body: {}", snippet));
    }
}

/// Logs `error.message` and `error.status` if the body is an error envelope.
/// Returns whether it was one.
fn log_error_envelope(raw: &str) -> bool {
    let Ok(root) = serde_json::from_str::<Value>(raw) else {
        return false;
    };
    let Some(err) = root.get("error") else {
        return false;
    };
    if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
        logw(format!("Gemini error message: {}", msg));
    }
    if let Some(status) = err.get("status").and_then(|v| v.as_str()) {
        logw(format!("Gemini error status: {}", status));
    }
    true
}

/// Concatenates the text parts of the first candidate. Logs and returns
/// `None` when the body is an error envelope or the prompt was blocked.
fn extract_output_text(resp_json: &str) -> Option<String> {
    if log_error_envelope(resp_json) {
        return None;
    }
    let root: Value = serde_json::from_str(resp_json).ok()?;

    if let Some(reason) = root
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|v| v.as_str())
    {
        logw(format!("Gemini blocked the prompt: {}", reason));
        return None;
    }

    let candidate = root.get("candidates")?.as_array()?.first()?;
    let parts = candidate.get("content")?.get("parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|v| v.as_str()))
        .collect();

    if text.trim().is_empty() {
        if let Some(reason) = candidate.get("finishReason").and_then(|v| v.as_str()) {
            logw(format!("Gemini finish reason: {}", reason));
        }
        return None;
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            api_key: "k".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn extracts_joined_text_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]},
            "finishReason":"STOP"}]}"#;
        assert_eq!(extract_output_text(body).as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn error_envelopes_yield_nothing() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert!(extract_output_text(body).is_none());
        let blocked = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(extract_output_text(blocked).is_none());
        assert!(extract_output_text("<html>").is_none());
        let empty = r#"{"candidates":[{"content":{"parts":[]},"finishReason":"MAX_TOKENS"}]}"#;
        assert!(extract_output_text(empty).is_none());
    }

    #[test]
    fn recognises_error_envelopes() {
        assert!(log_error_envelope(
            r#"{"error":{"code":403,"message":"denied","status":"PERMISSION_DENIED"}}"#
        ));
        assert!(!log_error_envelope(r#"{"candidates":[]}"#));
        assert!(!log_error_envelope("Bad Gateway"));
    }

    #[test]
    fn request_carries_schema_and_sampling() {
        let backend = GeminiBackend::with_client(Client::new(), &config());
        let schema = json!({"type": "OBJECT"});
        let body = backend.request_body("hello", &schema);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        let gen_cfg = &body["generationConfig"];
        assert_eq!(gen_cfg["responseMimeType"], "application/json");
        assert_eq!(gen_cfg["responseSchema"], schema);
        assert!((gen_cfg["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);
        assert!(backend.endpoint().ends_with("/v1beta/models/gemini-2.5-flash:generateContent"));
    }
}
