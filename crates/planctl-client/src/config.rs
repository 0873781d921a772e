use std::env;

/// Management API connection settings.
///
/// Reads from the `PLANCTL_API_URL` and `PLANCTL_TOKEN` environment
/// variables, falling back to a local default gateway when unset.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the management REST API.
    pub api_url: String,
    /// Bearer token attached to every request when present.
    pub token: Option<String>,
}

impl ClientConfig {
    /// The default base URL used when no environment variable is set.
    pub const DEFAULT_API_URL: &str = "http://localhost:8083/management/v2";

    /// Build a config from the environment.
    ///
    /// Priority: `PLANCTL_API_URL` / `PLANCTL_TOKEN` env vars, then the
    /// compile-time default (no token).
    pub fn from_env() -> Self {
        let api_url =
            env::var("PLANCTL_API_URL").unwrap_or_else(|_| Self::DEFAULT_API_URL.to_owned());
        let token = env::var("PLANCTL_TOKEN").ok();
        Self { api_url, token }
    }

    /// Build a config from an explicit URL (useful for tests and CLI flags).
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: None,
        }
    }

    /// Attach a bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url() {
        let cfg = ClientConfig::new(ClientConfig::DEFAULT_API_URL);
        assert_eq!(cfg.api_url, "http://localhost:8083/management/v2");
        assert!(cfg.token.is_none());
    }

    #[test]
    fn explicit_new_with_token() {
        let cfg = ClientConfig::new("https://apim.example.com/management/v2").with_token("t0k3n");
        assert_eq!(cfg.api_url, "https://apim.example.com/management/v2");
        assert_eq!(cfg.token.as_deref(), Some("t0k3n"));
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let cfg = ClientConfig::new("http://localhost:8083/management/v2/");
        assert_eq!(cfg.base_url(), "http://localhost:8083/management/v2");
    }
}
