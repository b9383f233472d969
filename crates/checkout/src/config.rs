//! Checkout settings.

use std::time::Duration;

use domain::PricingConfig;

/// Default upper bound on a single payment gateway call.
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the order placement workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub pricing: PricingConfig,
    pub gateway_timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }
}

impl CheckoutConfig {
    pub fn with_pricing(mut self, pricing: PricingConfig) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }
}
