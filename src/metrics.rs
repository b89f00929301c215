use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("pcbuild_recommend_requests_total", "Total number of recommend requests").unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("pcbuild_rate_limited_total", "Requests refused by the client quota").unwrap();
    pub static ref BAD_REQUESTS: Counter =
        register_counter!("pcbuild_bad_requests_total", "Requests refused for payload shape or size").unwrap();
    pub static ref VALIDATIONS: Counter =
        register_counter!("pcbuild_validations_total", "Builds run through the validator").unwrap();
    pub static ref INCOMPATIBLE_BUILDS: Counter =
        register_counter!("pcbuild_incompatible_builds_total", "Validated builds with at least one failed check").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("pcbuild_cache_hits_total", "Total reply cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("pcbuild_cache_misses_total", "Total reply cache misses").unwrap();
    pub static ref CACHE_SIZE: Gauge =
        register_gauge!("pcbuild_cache_size", "Current number of cached replies").unwrap();
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("pcbuild_tracked_clients", "Client keys currently holding a quota entry").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "pcbuild_recommend_latency_seconds",
        "End-to-end recommend latency in seconds"
    )
    .unwrap();
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "pcbuild_upstream_latency_seconds",
        "Completion upstream latency in seconds"
    )
    .unwrap();
}
