//! Provider abstraction for release hosting APIs.
//!
//! A provider lists the releases of a repository. The GitHub implementation
//! talks to the REST API; [`CachingProvider`] wraps any provider with a short
//! TTL cache and in-flight request deduplication.

mod cache;
mod github;
mod repo_ref;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ResolveError;

pub use cache::CachingProvider;
pub use github::{DEFAULT_API_URL, GitHubProvider, decode_release_list};
pub use repo_ref::{GITHUB_HOST, RepositoryRef, parse_repository_ref};

/// A downloadable build artifact attached to a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReleaseAsset {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub browser_download_url: String,
}

/// One release as listed by the provider.
///
/// Every field tolerates being absent or `null` in the payload; a release
/// without a tag is kept and later treated as "no update".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReleaseInfo {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Release notes (Markdown).
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assets: Vec<ReleaseAsset>,
    /// Source archive generated by the provider.
    #[serde(default, deserialize_with = "null_as_default")]
    pub zipball_url: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// How an access token travels to the provider.
///
/// `Query` appends `access_token=<token>` to request and package URLs. It is
/// kept for compatibility with deployments that relied on it, but it leaks the
/// token into access logs and referrers.
///
/// With `Header` only the API request carries the token; package URLs are
/// left bare. Packages of private repositories then need `Query` or
/// authentication configured on the host that downloads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenTransport {
    #[default]
    Header,
    Query,
}

impl fmt::Display for TokenTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenTransport::Header => write!(f, "header"),
            TokenTransport::Query => write!(f, "query"),
        }
    }
}

impl FromStr for TokenTransport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "header" => Ok(TokenTransport::Header),
            "query" => Ok(TokenTransport::Query),
            _ => anyhow::bail!("Unknown token transport: {}. Expected header or query.", s),
        }
    }
}

/// Trait for release providers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the API base URL.
    fn api_url(&self) -> &str;

    /// List the releases of a repository in provider order (newest first).
    async fn list_releases(&self, repo: &RepositoryRef) -> Result<Vec<ReleaseInfo>, ResolveError>;
}
