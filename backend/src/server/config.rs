//! HTTP server configuration object.

use std::net::SocketAddr;
use std::time::Duration;

use library_backend::domain::DEFAULT_VERIFICATION_TIMEOUT;
use library_backend::inbound::http::state::HttpStatePorts;

/// Everything [`super::create_server`] needs once adapters are chosen.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) ports: HttpStatePorts,
    pub(crate) verification_timeout: Duration,
}

impl ServerConfig {
    #[must_use]
    pub fn new(bind_addr: SocketAddr, ports: HttpStatePorts) -> Self {
        Self {
            bind_addr,
            ports,
            verification_timeout: DEFAULT_VERIFICATION_TIMEOUT,
        }
    }

    /// Bound each credential introspection call.
    #[must_use]
    pub fn with_verification_timeout(mut self, timeout: Duration) -> Self {
        self.verification_timeout = timeout;
        self
    }
}
