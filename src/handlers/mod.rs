mod health;
mod metrics;
mod recommend;
mod validate;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use recommend::recommend_handler;
pub use validate::validate_handler;
