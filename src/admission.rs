//! Request admission for the recommend endpoint.
//!
//! A chat request is checked in a fixed order: client quota first (so even a
//! malformed request spends one slot), then payload shape, conversation size
//! and finally each message. The first failing step decides the rejection.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderMap;
use clap::ValueEnum;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::models::{ChatMessage, Role};
use crate::rate_limit::{QuotaOutcome, QuotaStore};

/// Shared bucket for clients without a forwarded address.
pub const FALLBACK_CLIENT_KEY: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Transient, retry after the window.
    RateLimited,
    /// Permanent for this payload.
    BadRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Too many requests. Please try again later.")]
    RateLimited,
    #[error("Messages array is required")]
    MissingMessages,
    #[error("Conversation is too long. Please start a new chat.")]
    ConversationTooLong,
    #[error("Invalid message role")]
    InvalidRole,
    #[error("Message content must be a non-empty string")]
    EmptyContent,
}

impl Rejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::RateLimited => RejectionKind::RateLimited,
            _ => RejectionKind::BadRequest,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AdmissionLimits {
    pub max_conversation_chars: usize,
}

impl Default for AdmissionLimits {
    fn default() -> Self {
        Self {
            max_conversation_chars: 5000,
        }
    }
}

/// Who shares a quota bucket when no forwarded address is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FallbackIdentity {
    /// Everyone without the header shares one bucket.
    #[default]
    Shared,
    /// Use the TCP peer address.
    Peer,
}

/// First entry of `X-Forwarded-For`, if any.
pub fn forwarded_client(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

pub fn client_key(headers: &HeaderMap, peer: SocketAddr, fallback: FallbackIdentity) -> String {
    forwarded_client(headers).unwrap_or_else(|| match fallback {
        FallbackIdentity::Shared => FALLBACK_CLIENT_KEY.to_string(),
        FallbackIdentity::Peer => peer.ip().to_string(),
    })
}

pub struct AdmissionGate {
    quotas: Arc<dyn QuotaStore>,
    limits: AdmissionLimits,
}

impl AdmissionGate {
    pub fn new(quotas: Arc<dyn QuotaStore>, limits: AdmissionLimits) -> Self {
        Self { quotas, limits }
    }

    pub fn quotas(&self) -> &Arc<dyn QuotaStore> {
        &self.quotas
    }

    /// Decide whether `payload` from `client_key` may reach the model.
    ///
    /// On success the conversation comes back typed and ready to forward.
    pub fn admit(&self, client_key: &str, payload: &Value) -> Result<Vec<ChatMessage>, Rejection> {
        if let QuotaOutcome::Exhausted { used } = self.quotas.try_acquire(client_key) {
            warn!(client = %client_key, used, "client over request quota");
            return Err(Rejection::RateLimited);
        }

        let messages = payload
            .get("messages")
            .and_then(Value::as_array)
            .ok_or(Rejection::MissingMessages)?;

        let total_chars: usize = messages.iter().map(content_chars).sum();
        if total_chars > self.limits.max_conversation_chars {
            return Err(Rejection::ConversationTooLong);
        }

        messages.iter().map(parse_message).collect()
    }
}

// UTF-16 code units, the unit browsers count in.
// Non-string content counts as nothing here, parse_message rejects it later
fn content_chars(msg: &Value) -> usize {
    msg.get("content")
        .and_then(Value::as_str)
        .map_or(0, |s| s.encode_utf16().count())
}

fn parse_message(msg: &Value) -> Result<ChatMessage, Rejection> {
    let role = msg
        .get("role")
        .and_then(Value::as_str)
        .and_then(Role::parse)
        .ok_or(Rejection::InvalidRole)?;

    let content = msg
        .get("content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(Rejection::EmptyContent)?;

    Ok(ChatMessage {
        role,
        content: content.to_string(),
    })
}
