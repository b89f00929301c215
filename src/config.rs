use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::admission::{AdmissionLimits, FallbackIdentity};
use crate::rate_limit::QuotaPolicy;
use crate::upstream::DEFAULT_SYSTEM_PROMPT;
use crate::validator::{TierTable, ValidatorConfig, tiers::TierTableError};

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "pcbuild-gateway")]
#[command(about = "PC build advisor: rate-limited chat gateway and build validator")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    // Chat-completions compatible upstream
    #[arg(short, long, default_value = "https://api.openai.com")]
    pub upstream: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, default_value = "gpt-4o-mini")]
    pub model: String,

    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    #[arg(long, default_value_t = 4000)]
    pub max_tokens: u32,

    // Replaces the built-in system prompt
    #[arg(long)]
    pub system_prompt_file: Option<PathBuf>,

    // Upstream request timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub upstream_timeout: u64,

    // Health check interval in seconds
    #[arg(long, default_value_t = 30)]
    pub health_interval: u64,

    // Reply cache TTL in seconds
    #[arg(short, long, default_value_t = 30)]
    pub cache_ttl: u64,

    // Pending completions before callers wait
    #[arg(long, default_value_t = 100)]
    pub queue_depth: usize,

    // Upstream calls in flight at once, cache hits skip this
    #[arg(long, default_value_t = 8)]
    pub max_inflight: usize,

    // Rate limit max requests per window
    #[arg(long, default_value_t = 5)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 60)]
    pub rate_window: u64,

    #[arg(long, default_value_t = 500)]
    pub max_tracked_clients: usize,

    // Quota bucket for requests without X-Forwarded-For
    #[arg(long, value_enum, default_value_t = FallbackIdentity::Shared)]
    pub fallback_identity: FallbackIdentity,

    // Summed message characters per conversation
    #[arg(long, default_value_t = 5000)]
    pub max_conversation_chars: usize,

    #[arg(long, default_value_t = 100)]
    pub power_headroom: u32,

    #[arg(long, default_value_t = 1.2)]
    pub psu_safety_factor: f64,

    // For GPUs with big transient spikes
    #[arg(long, default_value_t = 1.3)]
    pub psu_transient_factor: f64,

    #[arg(long, default_value_t = 50)]
    pub psu_rounding: u32,

    #[arg(long, default_value_t = 120)]
    pub thermal_tdp_threshold: u32,

    #[arg(long, default_value_t = 240)]
    pub itx_radiator_limit: u32,

    // JSON tier table, built-in ladder when absent
    #[arg(long)]
    pub tier_table: Option<PathBuf>,
}

impl Args {
    pub fn quota_policy(&self) -> QuotaPolicy {
        QuotaPolicy {
            limit: self.rate_limit,
            window: Duration::from_secs(self.rate_window),
            max_tracked: self.max_tracked_clients,
        }
    }

    pub fn admission_limits(&self) -> AdmissionLimits {
        AdmissionLimits {
            max_conversation_chars: self.max_conversation_chars,
        }
    }

    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            power_headroom_watts: self.power_headroom,
            safety_factor: self.psu_safety_factor,
            transient_safety_factor: self.psu_transient_factor,
            wattage_rounding: self.psu_rounding,
            thermal_tdp_threshold: self.thermal_tdp_threshold,
            compact_radiator_limit_mm: self.itx_radiator_limit,
            ..ValidatorConfig::default()
        }
    }

    pub fn load_tier_table(&self) -> Result<TierTable, TierTableError> {
        match &self.tier_table {
            Some(path) => TierTable::from_path(path),
            None => Ok(TierTable::default()),
        }
    }

    pub fn load_system_prompt(&self) -> std::io::Result<String> {
        match &self.system_prompt_file {
            Some(path) => std::fs::read_to_string(path),
            None => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}
