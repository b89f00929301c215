use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::components::Component;
use crate::error::CompletionError;
use crate::validator::{BuildReport, BuildSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

// Chat-completions request format
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

// Chat-completions response, only the fields we read
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub reply: String,
}

// Queued job - admitted conversation + channel for the reply
pub struct CompletionJob {
    pub conversation: Vec<ChatMessage>,
    pub response_tx: oneshot::Sender<Result<String, CompletionError>>,
}

// Either a bare parts list or one wrapped with a budget
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ValidateRequest {
    Parts(Vec<Component>),
    Build {
        components: Vec<Component>,
        #[serde(default)]
        budget: Option<f64>,
    },
}

impl ValidateRequest {
    pub fn into_parts(self) -> (Vec<Component>, Option<f64>) {
        match self {
            ValidateRequest::Parts(components) => (components, None),
            ValidateRequest::Build { components, budget } => (components, budget),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    #[serde(flatten)]
    pub report: BuildReport,
    pub compatible: bool,
    pub summary: BuildSummary,
}
