//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `beacon.toml`.
//!     loads configuration from file or falls back to defaults,
//!     then applies environment overrides (.env included).
//!
//! structure:
//!     - role: which half of the system this process runs.
//!     - ServerConfig: where the alert service listens.
//!     - ListenerConfig: backend url, audio assets, player, poll cadence.
//!     - LoggingConfig: default log filter when RUST_LOG is unset.
//!
//! ==============================================================================

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// which component this process runs
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// holds the state, serves /simulate and /alert
    #[default]
    Service,
    /// polls /alert and plays cues
    Listener,
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "service" | "server" => Ok(Role::Service),
            "listener" | "pi" => Ok(Role::Listener),
            other => Err(anyhow!("unknown role '{}' (expected service or listener)", other)),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BeaconConfig {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:8000".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ListenerConfig {
    /// full url of the service's GET /alert endpoint
    pub backend_url: Option<String>,
    pub audio_dir: PathBuf,
    /// cue file extension, without the dot
    pub audio_ext: String,
    /// external player invoked as `<player> <file>`
    pub player: String,
    pub interval_seconds: u64,
    pub timeout_seconds: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            audio_dir: PathBuf::from("/home/pi/audio"),
            audio_ext: "mp3".to_string(),
            player: "mpg123".to_string(),
            interval_seconds: 60,
            timeout_seconds: 3,
        }
    }
}

impl ListenerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    /// the backend url, or an error explaining how to set it
    pub fn require_backend_url(&self) -> Result<&str> {
        match self.backend_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => bail!("listener.backend_url is not set (set it in beacon.toml or BACKEND_URL)"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl BeaconConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| anyhow!("Failed to parse config: {}", e))
    }

    /// Load with default fallback.
    ///
    /// runs before logging is initialised, so problems are returned as
    /// notes for the caller to log once the subscriber is up.
    pub fn load_or_default() -> (Self, Vec<String>) {
        let paths = [
            PathBuf::from("config").join("beacon.toml"),
            PathBuf::from("..").join("config").join("beacon.toml"),
        ];
        let mut notes = Vec::new();

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        notes.push(format!("Loaded from {}", path.display()));
                        return (config, notes);
                    }
                    Err(e) => {
                        notes.push(format!("Warning: Failed to load {}: {:#}", path.display(), e));
                    }
                }
            }
        }

        notes.push("Warning: No config file found - using defaults".to_string());
        (Self::default(), notes)
    }

    /// apply BEACON_ROLE and BACKEND_URL from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(
            std::env::var("BEACON_ROLE").ok().as_deref(),
            std::env::var("BACKEND_URL").ok().as_deref(),
        )
    }

    fn apply_overrides(&mut self, role: Option<&str>, backend_url: Option<&str>) -> Result<()> {
        if let Some(role) = role {
            self.role = role.parse().context("BEACON_ROLE")?;
        }
        if let Some(url) = backend_url.filter(|u| !u.trim().is_empty()) {
            self.listener.backend_url = Some(url.trim().to_string());
        }
        Ok(())
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        tracing::info!(role = ?self.role, log_level = %self.logging.level, "configuration");
        match self.role {
            Role::Service => tracing::info!(bind = %self.server.bind, "service settings"),
            Role::Listener => tracing::info!(
                backend_url = self.listener.backend_url.as_deref().unwrap_or("<unset>"),
                audio_dir = %self.listener.audio_dir.display(),
                player = %self.listener.player,
                interval_s = self.listener.interval_seconds,
                timeout_s = self.listener.timeout_seconds,
                "listener settings"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = BeaconConfig::parse("").unwrap();
        assert_eq!(config.role, Role::Service);
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert_eq!(config.listener.interval_seconds, 60);
        assert_eq!(config.listener.timeout_seconds, 3);
        assert_eq!(config.listener.player, "mpg123");
        assert!(config.listener.backend_url.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = BeaconConfig::parse(
            r#"
role = "listener"

[listener]
backend_url = "http://10.0.0.5:8000/alert"
audio_dir = "/opt/audio"
"#,
        )
        .unwrap();

        assert_eq!(config.role, Role::Listener);
        assert_eq!(config.listener.require_backend_url().unwrap(), "http://10.0.0.5:8000/alert");
        assert_eq!(config.listener.audio_dir, PathBuf::from("/opt/audio"));
        assert_eq!(config.listener.audio_ext, "mp3");
        assert_eq!(config.listener.interval(), Duration::from_secs(60));
    }

    #[test]
    fn bad_role_is_a_parse_error() {
        assert!(BeaconConfig::parse(r#"role = "hub""#).is_err());
    }

    #[test]
    fn env_overrides_win() {
        let mut config = BeaconConfig::default();
        config
            .apply_overrides(Some("listener"), Some(" http://backend/alert "))
            .unwrap();
        assert_eq!(config.role, Role::Listener);
        assert_eq!(config.listener.backend_url.as_deref(), Some("http://backend/alert"));

        assert!(config.apply_overrides(Some("nope"), None).is_err());
    }

    #[test]
    fn missing_backend_url_is_reported() {
        let mut config = BeaconConfig::default();
        assert!(config.listener.require_backend_url().is_err());
        config.listener.backend_url = Some("   ".into());
        assert!(config.listener.require_backend_url().is_err());
    }
}
