use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::{Duration, interval};
use tracing::{info, warn};

use crate::error::CompletionError;
use crate::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Role};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a PC building assistant. Ask for budget and \
use case when they are missing. When recommending a build, list CPU, GPU, motherboard, RAM, \
storage, power supply, case and cooler with estimated prices, show the total, keep it close to \
the stated budget, and check compatibility before answering. Format replies in Markdown.";

// The completion server we forward admitted chats to
pub struct Upstream {
    pub url: String,
    healthy: AtomicBool,
}

impl Upstream {
    pub fn new(url: &str) -> Self {
        let url = url.trim().trim_end_matches('/');
        // add http:// if not present
        let url = if url.starts_with("http") {
            url.to_string()
        } else {
            format!("http://{}", url)
        };
        Self {
            url,
            healthy: AtomicBool::new(true),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Relaxed);
    }

    pub fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.url)
    }
}

// Everything needed to turn a conversation into one upstream call
#[derive(Clone)]
pub struct CompletionClient {
    pub client: reqwest::Client,
    pub upstream: Arc<Upstream>,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl CompletionClient {
    // System prompt goes first, then the admitted conversation as-is
    pub fn build_request(&self, conversation: &[ChatMessage]) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(ChatMessage {
            role: Role::System,
            content: self.system_prompt.clone(),
        });
        messages.extend_from_slice(conversation);

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub async fn complete(&self, conversation: &[ChatMessage]) -> Result<String, CompletionError> {
        let mut req = self
            .client
            .post(self.upstream.completions_url())
            .json(&self.build_request(conversation));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatCompletionResponse = res.json().await?;
        first_reply(body)
    }
}

fn first_reply(body: ChatCompletionResponse) -> Result<String, CompletionError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|s| !s.is_empty())
        .ok_or(CompletionError::EmptyReply)
}

// Health check function - polls the models listing on a fixed interval
pub async fn health_checker(
    upstream: Arc<Upstream>,
    client: reqwest::Client,
    api_key: Option<String>,
    check_interval: Duration,
) {
    let mut interval = interval(check_interval);

    info!(interval = ?check_interval, "upstream health checker started");

    loop {
        interval.tick().await;

        let url = format!("{}/v1/models", upstream.url);
        let was_healthy = upstream.is_healthy();

        let mut req = client.get(&url).timeout(Duration::from_secs(5));
        if let Some(key) = &api_key {
            req = req.bearer_auth(key);
        }
        let is_healthy = match req.send().await {
            Ok(res) => res.status().is_success(),
            Err(_) => false,
        };
        upstream.set_healthy(is_healthy);

        // Log status changes
        if was_healthy != is_healthy {
            if is_healthy {
                info!(upstream = %upstream.url, "upstream is now healthy");
            } else {
                warn!(upstream = %upstream.url, "upstream is now unhealthy");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CompletionClient {
        CompletionClient {
            client: reqwest::Client::new(),
            upstream: Arc::new(Upstream::new("localhost:8000/")),
            api_key: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            max_tokens: 4000,
            system_prompt: "be helpful".into(),
        }
    }

    #[test]
    fn normalizes_upstream_url() {
        let up = Upstream::new(" localhost:8000/ ");
        assert_eq!(up.completions_url(), "http://localhost:8000/v1/chat/completions");
        assert_eq!(Upstream::new("https://api.openai.com").url, "https://api.openai.com");
    }

    #[test]
    fn system_prompt_is_prepended() {
        let convo = vec![ChatMessage {
            role: Role::User,
            content: "gaming rig for 1500".into(),
        }];
        let req = client().build_request(&convo);

        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.messages[0].content, "be helpful");
        assert_eq!(req.messages[1], convo[0]);

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 4000);
    }

    #[test]
    fn empty_choices_is_an_error() {
        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(first_reply(empty), Err(CompletionError::EmptyReply)));

        let null: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(matches!(first_reply(null), Err(CompletionError::EmptyReply)));
    }

    #[test]
    fn health_flag_toggles() {
        let up = Upstream::new("localhost:1");
        assert!(up.is_healthy());
        up.set_healthy(false);
        assert!(!up.is_healthy());
    }
}
