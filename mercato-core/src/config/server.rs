//! Server configuration.

use std::net::SocketAddr;

/// Default header carrying the caller's user id, set by the upstream auth layer.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-authenticated-user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Lowercase header name the `Caller` extractor reads.
    pub identity_header: String,
}
