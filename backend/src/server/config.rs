//! HTTP server configuration object.

use std::net::SocketAddr;
use std::time::Duration;

use walk_backend::config::ApiSettings;

/// Listener and request settings for [`super::create_server`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) request_timeout: Duration,
    pub(crate) version: String,
}

impl ServerConfig {
    /// Resolve the bind address from the API settings.
    ///
    /// # Errors
    /// Returns [`std::io::Error`] when the host is not an IP address.
    pub fn from_settings(settings: &ApiSettings) -> std::io::Result<Self> {
        let bind_addr = format!("{}:{}", settings.host(), settings.port())
            .parse::<SocketAddr>()
            .map_err(|err| {
                std::io::Error::other(format!(
                    "invalid API bind address {}:{}: {err}",
                    settings.host(),
                    settings.port()
                ))
            })?;
        Ok(Self {
            bind_addr,
            request_timeout: settings.request_timeout(),
            version: settings.version().to_owned(),
        })
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
