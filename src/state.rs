use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use crate::admission::{AdmissionGate, FallbackIdentity};
use crate::cache::CacheEntry;
use crate::models::CompletionJob;
use crate::upstream::Upstream;
use crate::validator::BuildValidator;
// app's shared state

pub struct AppState {
    pub gate: AdmissionGate,
    pub fallback_identity: FallbackIdentity, // who shares the quota bucket without X-Forwarded-For
    pub validator: BuildValidator,
    pub upstream: Arc<Upstream>,
    pub cache: Arc<DashMap<String, CacheEntry>>, // conversation hash -> reply
    pub job_tx: mpsc::Sender<CompletionJob>,
}
