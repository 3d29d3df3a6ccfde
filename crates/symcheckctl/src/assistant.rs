//! Chat Assistant - OpenAI-compatible chat completions with streaming
//!
//! Works against any `/chat/completions` endpoint, local (Ollama) or
//! remote. Replies are streamed as Server-Sent Events and forwarded chunk
//! by chunk to the caller's sink.

use std::io::{BufRead, BufReader};
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use symcheck_common::config::AssistantConfig;
use symcheck_common::{AssistContext, AssistError, AssistTurn, Assessment, QuestionAssistant};

use crate::prompts::{assessment_prompt, question_prompt};

const SYSTEM_PROMPT: &str = "You assist a symptom checker. Answer briefly and never give a \
                             diagnosis that the patient's answers do not support.";

const MAX_TOKENS: u32 = 400;

pub struct ChatAssistant {
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl ChatAssistant {
    pub fn new(config: &AssistantConfig) -> Result<Self, AssistError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one prompt and stream the reply into `sink`.
    fn complete(&self, prompt: &str, sink: &mut dyn FnMut(&str)) -> Result<String, AssistError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt }
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": 0.7,
            "stream": true
        });

        let mut req = self.http.post(&url).header("Content-Type", "application/json");
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        debug!("Assistant request to {} ({})", url, self.model);
        let response = req
            .json(&body)
            .send()
            .map_err(|e| AssistError::Http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().unwrap_or_default();
            return Err(AssistError::Http(format!("HTTP {}: {}", status, text)));
        }

        read_sse(BufReader::new(response), sink)
    }
}

/// Read an SSE chat-completion stream, forwarding each content delta to
/// `sink`. Returns the concatenated reply.
pub fn read_sse<R: BufRead>(reader: R, sink: &mut dyn FnMut(&str)) -> Result<String, AssistError> {
    let mut reply = String::new();

    for line in reader.lines() {
        let line = line.map_err(|e| AssistError::Http(format!("Failed to read stream: {}", e)))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim_start();
        if data == "[DONE]" {
            break;
        }

        let chunk: serde_json::Value = serde_json::from_str(data)
            .map_err(|e| AssistError::Http(format!("Failed to parse chunk: {}", e)))?;

        if let Some(content) = chunk["choices"][0]["delta"]["content"].as_str() {
            if !content.is_empty() {
                sink(content);
                reply.push_str(content);
            }
        }
    }

    if reply.trim().is_empty() {
        return Err(AssistError::EmptyResponse);
    }
    Ok(reply)
}

impl QuestionAssistant for ChatAssistant {
    fn next_turn(
        &self,
        ctx: &AssistContext,
        sink: &mut dyn FnMut(&str),
    ) -> Result<AssistTurn, AssistError> {
        let reply = self.complete(&question_prompt(ctx), sink)?;
        Ok(AssistTurn::from_reply(&reply))
    }

    fn assess(
        &self,
        ctx: &AssistContext,
        sink: &mut dyn FnMut(&str),
    ) -> Result<Assessment, AssistError> {
        let reply = self.complete(&assessment_prompt(ctx), sink)?;
        Ok(Assessment::from_text(reply.trim()))
    }
}
