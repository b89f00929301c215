use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};
use crate::models::ChatMessage;

// Cached reply with timestamp
#[derive(Clone)]
pub struct CacheEntry {
    pub reply: String,
    pub created_at: Instant,
}

impl CacheEntry {
    pub fn new(reply: String) -> Self {
        Self {
            reply,
            created_at: Instant::now(),
        }
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() < ttl
    }
}

// Cache key = hash of model + every (role, content) pair
pub fn make_cache_key(model: &str, conversation: &[ChatMessage]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model);
    for msg in conversation {
        // separators so ("ab","c") and ("a","bc") differ
        hasher.update([0u8]);
        hasher.update(msg.role.as_str());
        hasher.update([0u8]);
        hasher.update(&msg.content);
    }
    format!("{:x}", hasher.finalize())
}
