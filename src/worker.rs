use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, warn};
use crate::cache::{CacheEntry, make_cache_key};
use crate::error::CompletionError;
use crate::metrics::{CACHE_HITS, CACHE_MISSES, CACHE_SIZE, UPSTREAM_LATENCY};
use crate::models::CompletionJob;
use crate::upstream::CompletionClient;

// Background worker -> cache hits answered inline, misses fanned out
// to at most `max_inflight` concurrent upstream calls
pub async fn completion_worker(
    mut rx: mpsc::Receiver<CompletionJob>,
    completer: CompletionClient,
    cache: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
    max_inflight: usize,
) {
    let permits = Arc::new(Semaphore::new(max_inflight.max(1)));
    info!(max_inflight, "completion worker started");

    while let Some(job) = rx.recv().await {
        let cache_key = make_cache_key(&completer.model, &job.conversation);

        // check cache first
        if let Some(entry) = cache.get(&cache_key) {
            if entry.is_fresh(ttl) {
                CACHE_HITS.inc();
                debug!("cache hit");
                let _ = job.response_tx.send(Ok(entry.reply.clone()));
                continue;
            }
        }
        CACHE_MISSES.inc();

        // waits here once every slot is busy, so the queue applies backpressure
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        let completer = completer.clone();
        let cache = Arc::clone(&cache);

        tokio::spawn(async move {
            let result = forward(&completer, &job, &cache, cache_key).await;
            drop(permit);

            // Send response back to handler
            let _ = job.response_tx.send(result);
        });
    }

    info!("completion queue closed, worker exiting");
}

async fn forward(
    completer: &CompletionClient,
    job: &CompletionJob,
    cache: &DashMap<String, CacheEntry>,
    cache_key: String,
) -> Result<String, CompletionError> {
    let started = Instant::now();
    let result = completer.complete(&job.conversation).await;
    UPSTREAM_LATENCY.observe(started.elapsed().as_secs_f64());

    match &result {
        Ok(reply) => {
            cache.insert(cache_key, CacheEntry::new(reply.clone()));
            CACHE_SIZE.set(cache.len() as f64);
            completer.upstream.set_healthy(true);
        }
        // transport failures mark the upstream down until the next health check
        Err(CompletionError::Request(e)) => {
            completer.upstream.set_healthy(false);
            warn!(upstream = %completer.upstream.url, error = %e, "upstream call failed, marked unhealthy");
        }
        Err(e) => warn!(error = %e, "upstream rejected completion"),
    }

    result
}

// Drop stale replies so the map does not grow without bound
pub async fn cache_sweeper(cache: Arc<DashMap<String, CacheEntry>>, ttl: Duration) {
    let mut interval = tokio::time::interval(ttl.max(Duration::from_secs(1)));

    loop {
        interval.tick().await;
        cache.retain(|_, entry| entry.is_fresh(ttl));
        CACHE_SIZE.set(cache.len() as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatMessage, Role};
    use crate::upstream::Upstream;
    use axum::{Json, Router, routing::post};
    use serde_json::json;
    use tokio::sync::{Barrier, oneshot};

    // nothing listens here, so a miss would fail
    const DEAD_UPSTREAM: &str = "127.0.0.1:9";

    fn completer(upstream: &str) -> CompletionClient {
        CompletionClient {
            client: reqwest::Client::new(),
            upstream: Arc::new(Upstream::new(upstream)),
            api_key: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            max_tokens: 4000,
            system_prompt: "be helpful".into(),
        }
    }

    fn ask(content: &str) -> (CompletionJob, oneshot::Receiver<Result<String, CompletionError>>) {
        let (response_tx, response_rx) = oneshot::channel();
        let job = CompletionJob {
            conversation: vec![ChatMessage {
                role: Role::User,
                content: content.into(),
            }],
            response_tx,
        };
        (job, response_rx)
    }

    async fn serve_upstream(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr.to_string()
    }

    #[tokio::test]
    async fn serves_fresh_entries_from_cache() {
        let convo = vec![ChatMessage {
            role: Role::User,
            content: "best GPU under 600?".into(),
        }];
        let cache = Arc::new(DashMap::new());
        cache.insert(
            make_cache_key("gpt-4o-mini", &convo),
            CacheEntry::new("RTX 4070".into()),
        );

        let (tx, rx) = mpsc::channel(4);
        let worker = tokio::spawn(completion_worker(
            rx,
            completer(DEAD_UPSTREAM),
            Arc::clone(&cache),
            Duration::from_secs(30),
            4,
        ));

        let (response_tx, response_rx) = oneshot::channel();
        tx.send(CompletionJob {
            conversation: convo,
            response_tx,
        })
        .await
        .unwrap();

        assert_eq!(response_rx.await.unwrap().unwrap(), "RTX 4070");

        drop(tx);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_upstream_is_marked_unhealthy() {
        let c = completer(DEAD_UPSTREAM);
        let upstream = Arc::clone(&c.upstream);
        let (tx, rx) = mpsc::channel(4);
        let worker = tokio::spawn(completion_worker(
            rx,
            c,
            Arc::new(DashMap::new()),
            Duration::from_secs(30),
            4,
        ));

        let (response_tx, response_rx) = oneshot::channel();
        tx.send(CompletionJob {
            conversation: vec![ChatMessage {
                role: Role::User,
                content: "hi".into(),
            }],
            response_tx,
        })
        .await
        .unwrap();

        let result = response_rx.await.unwrap();
        assert!(matches!(result, Err(CompletionError::Request(_))));
        assert!(!upstream.is_healthy());

        drop(tx);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn misses_are_answered_concurrently() {
        // each upstream call blocks until both have arrived
        let barrier = Arc::new(Barrier::new(2));
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let barrier = Arc::clone(&barrier);
                async move {
                    barrier.wait().await;
                    Json(json!({"choices": [{"message": {"content": "ok"}}]}))
                }
            }),
        );
        let upstream = serve_upstream(app).await;

        let (tx, rx) = mpsc::channel(4);
        let worker = tokio::spawn(completion_worker(
            rx,
            completer(&upstream),
            Arc::new(DashMap::new()),
            Duration::from_secs(30),
            2,
        ));

        let (first, first_rx) = ask("1440p build?");
        let (second, second_rx) = ask("4k build?");
        tx.send(first).await.unwrap();
        tx.send(second).await.unwrap();

        let (a, b) = tokio::time::timeout(Duration::from_secs(5), async {
            (first_rx.await.unwrap(), second_rx.await.unwrap())
        })
        .await
        .expect("second miss waited behind the first");
        assert_eq!(a.unwrap(), "ok");
        assert_eq!(b.unwrap(), "ok");

        drop(tx);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn cache_hit_not_held_up_by_slow_miss() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                std::future::pending::<()>().await;
                Json(json!({}))
            }),
        );
        let upstream = serve_upstream(app).await;

        let cache = Arc::new(DashMap::new());
        let (cached, cached_rx) = ask("best GPU under 600?");
        cache.insert(
            make_cache_key("gpt-4o-mini", &cached.conversation),
            CacheEntry::new("RTX 4070".into()),
        );

        let (tx, rx) = mpsc::channel(4);
        let worker = tokio::spawn(completion_worker(
            rx,
            completer(&upstream),
            cache,
            Duration::from_secs(30),
            1,
        ));

        let (stuck, _stuck_rx) = ask("never answered");
        tx.send(stuck).await.unwrap();
        tx.send(cached).await.unwrap();

        let reply = tokio::time::timeout(Duration::from_secs(5), cached_rx)
            .await
            .expect("cache hit waited behind a pending miss")
            .unwrap();
        assert_eq!(reply.unwrap(), "RTX 4070");

        drop(tx);
        worker.await.unwrap();
    }
}
