//! Client configuration.
//!
//! Read from TOML:
//!
//! ```toml
//! base_url = "http://localhost:3000"
//! schema = "public"
//! user = "authenticator"
//! password = "secret"
//! timeout_secs = 30
//! count = "exact"
//! ```

use crate::error::{PostgrestError, PostgrestResult};
use crate::types::CountPreference;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "pgrest.toml";

/// Schema used when neither the file nor an override names one.
pub const DEFAULT_SCHEMA: &str = "public";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Root URL of the PostgREST server
    pub base_url: String,

    /// Default schema for every request
    pub schema: Option<String>,

    pub user: Option<String>,
    pub password: Option<String>,

    /// Bearer token (JWT); takes precedence over user/password
    pub token: Option<String>,

    /// Transport timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Count strategy used when a request doesn't ask for one
    pub count: Option<CountPreference>,
}

/// Values given on the command line or through the environment. Each one
/// set replaces the file's value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub schema: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl ClientConfig {
    /// Create a new configuration builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    pub fn from_toml(content: &str) -> PostgrestResult<Self> {
        let config: ClientConfig =
            toml::from_str(content).map_err(|e| PostgrestError::config(e.to_string()))?;
        if config.base_url.trim().is_empty() {
            return Err(PostgrestError::config("base_url must not be empty"));
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> PostgrestResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Load the first config found: `explicit`, then `./pgrest.toml`, then
    /// the user config dir (`~/.config/pgrest/config.toml` on Linux).
    pub fn discover(explicit: Option<&Path>) -> PostgrestResult<Option<Self>> {
        Self::discover_in(explicit, Path::new("."), dirs::config_dir().as_deref())
    }

    /// [`discover`](Self::discover) against explicit directories.
    /// `Ok(None)` when no candidate file exists.
    pub fn discover_in(
        explicit: Option<&Path>,
        local_dir: &Path,
        config_dir: Option<&Path>,
    ) -> PostgrestResult<Option<Self>> {
        if let Some(path) = explicit {
            return Self::load(path).map(Some);
        }
        for candidate in Self::candidates(local_dir, config_dir) {
            if candidate.is_file() {
                tracing::debug!("Loading config from {}", candidate.display());
                return Self::load(&candidate).map(Some);
            }
        }
        Ok(None)
    }

    fn candidates(local_dir: &Path, config_dir: Option<&Path>) -> Vec<PathBuf> {
        let mut paths = vec![local_dir.join(LOCAL_CONFIG_FILE)];
        if let Some(dir) = config_dir {
            paths.push(dir.join("pgrest").join("config.toml"));
        }
        paths
    }

    /// Apply `overrides` on top of this config. A schema missing from both
    /// falls back to [`DEFAULT_SCHEMA`].
    pub fn overlay(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(url) = &overrides.base_url {
            self.base_url = url.clone();
        }
        if let Some(schema) = &overrides.schema {
            self.schema = Some(schema.clone());
        }
        if self.schema.is_none() {
            self.schema = Some(DEFAULT_SCHEMA.to_string());
        }
        if let Some(user) = &overrides.user {
            self.user = Some(user.clone());
        }
        if let Some(password) = &overrides.password {
            self.password = Some(password.clone());
        }
        if let Some(token) = &overrides.token {
            self.token = Some(token.clone());
        }
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.config.schema = Some(schema.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.config.user = Some(user.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    pub fn count(mut self, count: CountPreference) -> Self {
        self.config.count = Some(count);
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full() {
        let config = ClientConfig::from_toml(
            r#"
            base_url = "http://db.local:3000"
            schema = "api"
            user = "web"
            password = "pw"
            timeout_secs = 5
            count = "planned"
            "#,
        )
        .unwrap();
        assert_eq!(config.count, Some(CountPreference::Planned));
        assert_eq!(config.base_url, "http://db.local:3000");
        assert_eq!(config.schema.as_deref(), Some("api"));
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.token, None);
    }

    #[test]
    fn test_rejects_empty_and_unknown() {
        assert!(ClientConfig::from_toml(r#"base_url = "  ""#).is_err());
        assert!(ClientConfig::from_toml(r#"schema = "api""#).is_err());
        assert!(
            ClientConfig::from_toml(
                r#"
                base_url = "http://x"
                bogus = 1
                "#
            )
            .is_err()
        );
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder()
            .base_url("http://x")
            .schema("public")
            .token("jwt")
            .timeout_secs(10)
            .build();
        assert_eq!(config.base_url, "http://x");
        assert_eq!(config.token.as_deref(), Some("jwt"));
        assert_eq!(config.timeout_secs, Some(10));
    }

    #[test]
    fn test_discover_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = \"http://from-file:3000\"").unwrap();

        let config = ClientConfig::discover(Some(file.path())).unwrap().unwrap();
        assert_eq!(config.base_url, "http://from-file:3000");
    }

    #[test]
    fn test_discover_missing_explicit_path_is_error() {
        let err = ClientConfig::discover(Some(Path::new("/nonexistent/pgrest.toml"))).unwrap_err();
        assert!(matches!(err, PostgrestError::Io(_)));
    }

    fn write_config(path: &Path, base_url: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, format!("base_url = \"{}\"\n", base_url)).unwrap();
    }

    #[test]
    fn test_discover_prefers_local_file() {
        let local = tempfile::tempdir().unwrap();
        let config_home = tempfile::tempdir().unwrap();
        write_config(&local.path().join("pgrest.toml"), "http://local:3000");
        write_config(
            &config_home.path().join("pgrest").join("config.toml"),
            "http://home:3000",
        );

        let config = ClientConfig::discover_in(None, local.path(), Some(config_home.path()))
            .unwrap()
            .unwrap();
        assert_eq!(config.base_url, "http://local:3000");
    }

    #[test]
    fn test_discover_falls_back_to_config_dir() {
        let local = tempfile::tempdir().unwrap();
        let config_home = tempfile::tempdir().unwrap();
        write_config(
            &config_home.path().join("pgrest").join("config.toml"),
            "http://home:3000",
        );

        let config = ClientConfig::discover_in(None, local.path(), Some(config_home.path()))
            .unwrap()
            .unwrap();
        assert_eq!(config.base_url, "http://home:3000");
    }

    #[test]
    fn test_discover_explicit_beats_local() {
        let local = tempfile::tempdir().unwrap();
        write_config(&local.path().join("pgrest.toml"), "http://local:3000");
        let explicit = local.path().join("other.toml");
        write_config(&explicit, "http://explicit:3000");

        let config = ClientConfig::discover_in(Some(&explicit), local.path(), None)
            .unwrap()
            .unwrap();
        assert_eq!(config.base_url, "http://explicit:3000");
    }

    #[test]
    fn test_discover_nothing_found() {
        let local = tempfile::tempdir().unwrap();
        let config_home = tempfile::tempdir().unwrap();
        let found =
            ClientConfig::discover_in(None, local.path(), Some(config_home.path())).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_overlay_replaces_file_values() {
        let file = ClientConfig::builder()
            .base_url("http://file:3000")
            .schema("api")
            .user("file-user")
            .password("file-pw")
            .build();
        let overrides = ConfigOverrides {
            base_url: Some("http://flag:3000".to_string()),
            user: Some("flag-user".to_string()),
            token: Some("jwt".to_string()),
            ..Default::default()
        };

        let config = file.overlay(&overrides);
        assert_eq!(config.base_url, "http://flag:3000");
        assert_eq!(config.schema.as_deref(), Some("api"));
        assert_eq!(config.user.as_deref(), Some("flag-user"));
        assert_eq!(config.password.as_deref(), Some("file-pw"));
        assert_eq!(config.token.as_deref(), Some("jwt"));
    }

    #[test]
    fn test_overlay_schema_fallback() {
        let bare = ClientConfig::builder().base_url("http://x").build();
        assert_eq!(
            bare.clone().overlay(&ConfigOverrides::default()).schema.as_deref(),
            Some(DEFAULT_SCHEMA)
        );

        let overrides = ConfigOverrides {
            schema: Some("audit".to_string()),
            ..Default::default()
        };
        assert_eq!(bare.overlay(&overrides).schema.as_deref(), Some("audit"));
    }
}
