// Configuration module entry point
// Loads startup configuration and builds the immutable application state

mod state;
mod types;

use std::net::{IpAddr, SocketAddr};

// Re-export public types
pub use state::AppState;
pub use types::Config;

/// Environment variable prefix, e.g. `ISOLATED_SERVE_SERVER__PORT=9000`
const ENV_PREFIX: &str = "ISOLATED_SERVE";

impl Config {
    /// Load configuration from built-in defaults overridden by environment variables.
    ///
    /// There is no configuration file; the command line is applied on top by the caller.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::defaults()?
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Configuration made of the built-in defaults only
    #[cfg(test)]
    pub fn from_defaults() -> Result<Self, config::ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    fn defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.root", ".")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?
            .set_default(
                "http.server_name",
                concat!("isolated-serve/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("http.index_files", vec!["index.html", "index.htm"])
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        self.server
            .host
            .parse::<IpAddr>()
            .map(|ip| SocketAddr::new(ip, self.server.port))
            .map_err(|e| format!("Invalid bind address '{}': {e}", self.server.host))
    }
}
