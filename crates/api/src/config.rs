//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use checkout::{CheckoutConfig, DEFAULT_GATEWAY_TIMEOUT};
use domain::{Money, PricingConfig};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset runs in memory
/// - `FREE_SHIPPING_THRESHOLD_CENTS`: default `10000`
/// - `FLAT_SHIPPING_FEE_CENTS`: default `999`
/// - `TAX_RATE_BPS`: default `800`
/// - `PAYMENT_TIMEOUT_MS`: default `10000`
/// - `PAYMENT_LATENCY_MS`: simulated gateway delay, default `0`
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub pricing: PricingConfig,
    pub payment_timeout: Duration,
    pub payment_latency: Duration,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    ///
    /// Values that fail to parse are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let pricing = PricingConfig {
            free_shipping_threshold: Money::from_cents(env_or(
                "FREE_SHIPPING_THRESHOLD_CENTS",
                defaults.pricing.free_shipping_threshold.cents(),
            )),
            flat_shipping_fee: Money::from_cents(env_or(
                "FLAT_SHIPPING_FEE_CENTS",
                defaults.pricing.flat_shipping_fee.cents(),
            )),
            tax_rate_bps: env_or("TAX_RATE_BPS", defaults.pricing.tax_rate_bps),
        };

        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            pricing,
            payment_timeout: Duration::from_millis(env_or(
                "PAYMENT_TIMEOUT_MS",
                defaults.payment_timeout.as_millis() as u64,
            )),
            payment_latency: Duration::from_millis(env_or("PAYMENT_LATENCY_MS", 0)),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings for the checkout workflow.
    pub fn checkout(&self) -> CheckoutConfig {
        CheckoutConfig::default()
            .with_pricing(self.pricing)
            .with_gateway_timeout(self.payment_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            pricing: PricingConfig::default(),
            payment_timeout: DEFAULT_GATEWAY_TIMEOUT,
            payment_latency: Duration::ZERO,
        }
    }
}
