use std::time::Duration;

use derive_setters::Setters;

/// Payment negotiation settings.
#[derive(Clone, Debug, Setters)]
#[setters(prefix = "with_", strip_option, into)]
pub struct PaymentOptions {
    /// Upper bound on an authorization's validity window. The server's
    /// `maxTimeoutSeconds` is used when shorter.
    pub max_validity: Duration,
    /// `validAfter` is backdated by this much to tolerate clock drift
    /// between client and facilitator.
    pub clock_skew: Duration,
    /// Only pay on this network; terms for any other network are refused.
    pub network: Option<String>,
}

impl Default for PaymentOptions {
    fn default() -> Self {
        Self {
            max_validity: Duration::from_secs(60),
            clock_skew: Duration::from_secs(5),
            network: None,
        }
    }
}
