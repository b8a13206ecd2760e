//! Endpoint and credential resolution.
//!
//! Turns the raw endpoint and token strings a caller hands in into a
//! [`Target`]. Two conventions are recognised:
//!
//! - an endpoint starting with [`TLS_PREFIX`] opts into TLS;
//! - a token starting with [`ENV_PREFIX`] (or the older
//!   [`LEGACY_ENV_PREFIX`]) names an environment variable holding the
//!   real token. An unset variable resolves to the empty string.
//!
//! Endpoint syntax is not checked here; a bad address shows up as a
//! connection failure.

/// Endpoint prefix that turns TLS on.
///
/// Endpoints are expected as `host:port`. A TLS endpoint without a port is
/// dialled on [`DEFAULT_TLS_PORT`]; a plaintext one on port 80.
pub const TLS_PREFIX: &str = "tls://";

/// Port used for a [`TLS_PREFIX`] endpoint that names no port.
pub const DEFAULT_TLS_PORT: u16 = 443;

/// Token prefix naming an environment variable.
pub const ENV_PREFIX: &str = "$";

/// Older spelling of [`ENV_PREFIX`], still accepted.
pub const LEGACY_ENV_PREFIX: &str = "env:";

/// A resolved connection target.
#[derive(Clone, PartialEq, Eq)]
pub struct Target {
    pub endpoint: String,
    pub token: String,
    pub use_tls: bool,
}

// Keep tokens out of logs.
impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("endpoint", &self.endpoint)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("use_tls", &self.use_tls)
            .finish()
    }
}

/// Prefix set used to resolve endpoints and tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolver {
    pub tls_prefix: &'static str,
    /// Checked in order; the first match wins.
    pub env_prefixes: &'static [&'static str],
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            tls_prefix: TLS_PREFIX,
            env_prefixes: &[ENV_PREFIX, LEGACY_ENV_PREFIX],
        }
    }
}

impl Resolver {
    /// Resolve against the process environment.
    ///
    /// `tls` is only consulted when the endpoint carries no TLS prefix.
    pub fn resolve(&self, endpoint: &str, token: &str, tls: bool) -> Target {
        self.resolve_with(endpoint, token, tls, |name| std::env::var(name).ok())
    }

    /// Resolve with a caller-supplied variable lookup.
    pub fn resolve_with<F>(&self, endpoint: &str, token: &str, tls: bool, lookup: F) -> Target
    where
        F: Fn(&str) -> Option<String>,
    {
        let (endpoint, use_tls) = match endpoint.strip_prefix(self.tls_prefix) {
            Some(rest) => (rest, true),
            None => (endpoint, tls),
        };

        let token = self
            .env_prefixes
            .iter()
            .find_map(|prefix| token.strip_prefix(*prefix))
            .map(|var| lookup(var).unwrap_or_default())
            .unwrap_or_else(|| token.to_string());

        Target {
            endpoint: endpoint.to_string(),
            token,
            use_tls,
        }
    }
}
