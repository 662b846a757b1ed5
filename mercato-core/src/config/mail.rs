//! Mail relay configuration.

use url::Url;

/// Where order confirmations are sent. Optional: without it confirmations
/// are only logged.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// HTTP endpoint accepting JSON messages.
    pub endpoint: Url,
    pub api_key: String,
    /// Sender address.
    pub from: String,
}
