mod admission;
mod cache;
mod components;
mod config;
mod error;
mod handlers;
mod metrics;
mod models;
mod rate_limit;
mod state;
mod telemetry;
mod upstream;
mod validator;
mod worker;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use clap::Parser; // for cli
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use crate::admission::AdmissionGate;
use crate::config::Args;
use crate::handlers::{health_handler, metrics_handler, recommend_handler, validate_handler};
use crate::models::CompletionJob;
use crate::rate_limit::{MemoryQuotaStore, QuotaStore, quota_sweeper};
use crate::state::AppState;
use crate::upstream::{CompletionClient, Upstream, health_checker};
use crate::validator::BuildValidator;
use crate::worker::{cache_sweeper, completion_worker};

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/recommend", post(recommend_handler))
        .route("/api/validate", post(validate_handler))
        .with_state(state)
}

// this is main async function with tokio
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    // parse cli arguments
    let args = Args::parse();

    let tiers = args.load_tier_table().context("loading tier table")?;
    let system_prompt = args.load_system_prompt().context("reading system prompt")?;

    let quota_policy = args.quota_policy();
    let quotas: Arc<dyn QuotaStore> = Arc::new(MemoryQuotaStore::new(quota_policy));
    let gate = AdmissionGate::new(Arc::clone(&quotas), args.admission_limits());
    let validator = BuildValidator::new(args.validator_config(), tiers);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.upstream_timeout))
        .build()
        .context("building HTTP client")?;
    let upstream = Arc::new(Upstream::new(&args.upstream));
    let completer = CompletionClient {
        client: client.clone(),
        upstream: Arc::clone(&upstream),
        api_key: args.api_key.clone(),
        model: args.model.clone(),
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        system_prompt,
    };

    let cache = Arc::new(DashMap::new());
    let ttl = Duration::from_secs(args.cache_ttl);
    let (job_tx, job_rx) = mpsc::channel::<CompletionJob>(args.queue_depth.max(1));

    // background tasks: worker, upstream health check, sweepers
    tokio::spawn(completion_worker(
        job_rx,
        completer,
        Arc::clone(&cache),
        ttl,
        args.max_inflight,
    ));
    tokio::spawn(health_checker(
        Arc::clone(&upstream),
        client,
        args.api_key.clone(),
        Duration::from_secs(args.health_interval.max(1)),
    ));
    tokio::spawn(quota_sweeper(Arc::clone(&quotas), quota_policy.window.max(Duration::from_secs(1))));
    tokio::spawn(cache_sweeper(Arc::clone(&cache), ttl));

    // creating shared state
    let state = Arc::new(AppState {
        gate,
        fallback_identity: args.fallback_identity,
        validator,
        upstream,
        cache,
        job_tx,
    });

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!(port = args.port, "gateway listening");
    info!(upstream = %args.upstream, model = %args.model, "forwarding chats");
    info!(
        limit = quota_policy.limit,
        window_secs = args.rate_window,
        "rate limit per client"
    );
    if args.api_key.is_none() {
        tracing::warn!("no API key configured, upstream calls are unauthenticated");
    }

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
