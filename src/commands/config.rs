//! Configuration file and environment overrides.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{
    checker::Resource,
    http::{HttpOptions, RetryPolicy},
    provider::DEFAULT_API_URL,
    resolver::ResolverOptions,
    runtime::{Runtime, non_empty_env},
};

use super::paths::{default_config_path, default_state_dir};

/// Environment variable holding the default access token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

const DEFAULT_CACHE_TTL_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    /// Default access token. Falls back to `GITHUB_TOKEN`.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub retry_attempts: usize,
    pub retry_delay_ms: u64,
    /// How long a fetched release list is reused. `0` only merges
    /// overlapping requests.
    pub cache_ttl_secs: u64,
    #[serde(flatten)]
    pub resolver: ResolverOptions,
    pub state_dir: Option<PathBuf>,
    pub resources: Vec<Resource>,
}

impl Default for Config {
    fn default() -> Self {
        let http = HttpOptions::default();
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            access_token: None,
            timeout_secs: http.timeout.as_secs(),
            connect_timeout_secs: http.connect_timeout.as_secs(),
            retry_attempts: http.retry.max_attempts,
            retry_delay_ms: http.retry.delay.as_millis() as u64,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            resolver: ResolverOptions::default(),
            state_dir: None,
            resources: Vec::new(),
        }
    }
}

impl Config {
    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used when present and built-in defaults otherwise.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(runtime, path)?,
            None => {
                let path = default_config_path(runtime)?;
                if runtime.exists(&path) {
                    Self::read(runtime, &path)?
                } else {
                    debug!("No config file at {}, using defaults", path.display());
                    Self::default()
                }
            }
        };

        config.access_token = config.access_token.filter(|t| !t.is_empty());
        if config.access_token.is_none() {
            config.access_token = non_empty_env(runtime, TOKEN_ENV);
            if config.access_token.is_some() {
                debug!("Using {} as the default access token", TOKEN_ENV);
            }
        }
        Ok(config)
    }

    fn read<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let content = runtime.read_to_string(path)?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            retry: RetryPolicy {
                max_attempts: self.retry_attempts,
                delay: Duration::from_millis(self.retry_delay_ms),
            },
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Directory holding the update-check token.
    pub fn state_dir<R: Runtime>(&self, runtime: &R) -> Result<PathBuf> {
        match &self.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_state_dir(runtime),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::ResourceKind;
    use crate::provider::TokenTransport;
    use crate::resolver::{ChangelogPolicy, ReleaseOrder};
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn runtime_with_token(token: Option<&'static str>) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq(TOKEN_ENV))
            .returning(move |_| token.map(String::from).ok_or(std::env::VarError::NotPresent));
        runtime
            .expect_config_dir()
            .returning(|| Some(PathBuf::from("/home/user/.config")));
        runtime
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.connect_timeout_secs, 5);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay_ms, 1000);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.resolver, ResolverOptions::default());
        assert!(config.resources.is_empty());
    }

    #[test]
    fn test_parse_full() {
        let config = Config::parse(
            r#"{
                "api_url": "https://ghe.example.com/api/v3",
                "timeout_secs": 3,
                "cache_ttl_secs": 0,
                "token_transport": "query",
                "release_order": "published",
                "changelog": "escape",
                "resources": [
                    {
                        "kind": "theme",
                        "slug": "twenty",
                        "homepage": "https://github.com/acme/twenty",
                        "installed_version": "1.0.0"
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.http_options().timeout, Duration::from_secs(3));
        assert_eq!(config.http_options().connect_timeout, Duration::from_secs(5));
        assert_eq!(config.cache_ttl(), Duration::ZERO);
        assert_eq!(config.resolver.token_transport, TokenTransport::Query);
        assert_eq!(config.resolver.release_order, ReleaseOrder::Published);
        assert_eq!(config.resolver.changelog, ChangelogPolicy::Escape);
        assert_eq!(config.resources[0].kind, ResourceKind::Theme);
    }

    #[test]
    fn test_parse_empty_object() {
        assert_eq!(Config::parse("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Config::parse("{").is_err());
        assert!(Config::parse(r#"{"token_transport": "cookie"}"#).is_err());
    }

    #[test]
    fn test_load_missing_default_file_uses_defaults() {
        let mut runtime = runtime_with_token(None);
        runtime.expect_exists().returning(|_| false);

        let config = Config::load(&runtime, None).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.access_token, None);
    }

    #[test]
    fn test_load_explicit_file() {
        let mut runtime = runtime_with_token(None);
        runtime
            .expect_read_to_string()
            .withf(|path| path == Path::new("/etc/ghupd.json"))
            .returning(|_| Ok(r#"{"access_token": "from-file"}"#.to_string()));

        let config = Config::load(&runtime, Some(Path::new("/etc/ghupd.json"))).unwrap();
        assert_eq!(config.access_token.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Err(anyhow::anyhow!("Failed to read file /nope.json")));

        assert!(Config::load(&runtime, Some(Path::new("/nope.json"))).is_err());
    }

    #[test]
    fn test_load_reports_invalid_file() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("not json".to_string()));

        let err = Config::load(&runtime, Some(Path::new("/bad.json"))).unwrap_err();
        assert!(err.to_string().contains("Invalid config file /bad.json"));
    }

    #[test]
    fn test_load_github_token_from_env() {
        let mut runtime = runtime_with_token(Some("env-token"));
        runtime.expect_exists().returning(|_| false);

        let config = Config::load(&runtime, None).unwrap();
        assert_eq!(config.access_token.as_deref(), Some("env-token"));
    }

    #[test]
    fn test_state_dir() {
        let runtime = runtime_with_token(None);

        let config = Config::default();
        assert_eq!(
            config.state_dir(&runtime).unwrap(),
            PathBuf::from("/home/user/.config/ghupd")
        );

        let config = Config {
            state_dir: Some(PathBuf::from("/var/lib/ghupd")),
            ..Config::default()
        };
        assert_eq!(
            config.state_dir(&runtime).unwrap(),
            PathBuf::from("/var/lib/ghupd")
        );
    }

    #[test]
    fn test_access_token_is_not_serialized() {
        let config = Config {
            access_token: Some("s3cret".into()),
            ..Config::default()
        };
        assert!(!serde_json::to_string(&config).unwrap().contains("s3cret"));
    }
}
