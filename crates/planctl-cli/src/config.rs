//! Configuration file management for planctl.
//!
//! Provides a TOML-based config file at `~/.config/planctl/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use planctl_client::config::ClientConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub connection: ConnectionSection,
    #[serde(default)]
    pub defaults: DefaultsSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionSection {
    /// Management API base URL.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DefaultsSection {
    /// API id plan commands operate on when no flag is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the planctl config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/planctl` or `~/.config/planctl`.
/// We intentionally ignore the platform-specific `dirs::config_dir()`
/// (which returns `~/Library/Application Support` on macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("planctl");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("planctl")
}

/// Return the path to the planctl config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since the file may hold a token.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// planctl init
// -----------------------------------------------------------------------

/// Execute the `planctl init` command: write the config file.
pub fn cmd_init(url: &str, token: Option<&str>, api: Option<&str>, force: bool) -> Result<()> {
    let path = config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = ConfigFile {
        connection: ConnectionSection {
            url: url.to_string(),
            token: token.map(str::to_owned),
        },
        defaults: DefaultsSection {
            api: api.map(str::to_owned),
        },
    };

    save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  connection.url = {url}");
    if token.is_some() {
        println!("  connection.token = (stored)");
    }
    if let Some(api) = api {
        println!("  defaults.api = {api}");
    }
    println!();
    println!("Next: run `planctl status` to check the connection.");

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct PlanctlConfig {
    pub client: ClientConfig,
    pub api_id: Option<String>,
}

impl PlanctlConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - API URL: `cli_api_url` > `PLANCTL_API_URL` env > `connection.url` > `ClientConfig::DEFAULT_API_URL`
    /// - Token: `cli_token` > `PLANCTL_TOKEN` env > `connection.token` > none
    /// - API id: `cli_api` > `PLANCTL_API` env > `defaults.api` > none
    pub fn resolve(
        cli_api_url: Option<&str>,
        cli_token: Option<&str>,
        cli_api: Option<&str>,
    ) -> Result<Self> {
        let file_config = load_config().ok();

        let api_url = if let Some(url) = cli_api_url {
            url.to_string()
        } else if let Ok(url) = std::env::var("PLANCTL_API_URL") {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.connection.url.clone()
        } else {
            ClientConfig::DEFAULT_API_URL.to_string()
        };

        let token = if let Some(token) = cli_token {
            Some(token.to_string())
        } else if let Ok(token) = std::env::var("PLANCTL_TOKEN") {
            Some(token)
        } else {
            file_config
                .as_ref()
                .and_then(|cfg| cfg.connection.token.clone())
        };

        let api_id = if let Some(api) = cli_api {
            Some(api.to_string())
        } else if let Ok(api) = std::env::var("PLANCTL_API") {
            Some(api)
        } else {
            file_config.as_ref().and_then(|cfg| cfg.defaults.api.clone())
        };

        let mut client = ClientConfig::new(api_url);
        if let Some(token) = token {
            client = client.with_token(token);
        }
        tracing::debug!(api_url = %client.api_url, "resolved connection settings");

        Ok(Self { client, api_id })
    }

    /// The API every plan command operates on.
    pub fn require_api(&self) -> Result<&str> {
        self.api_id.as_deref().context(
            "no API selected; pass --api, set PLANCTL_API, or store defaults.api with `planctl init`",
        )
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
