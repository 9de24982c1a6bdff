//! GitHub provider implementation.

use async_trait::async_trait;
use log::debug;

use crate::error::ResolveError;
use crate::http::HttpClient;

use super::{Provider, ReleaseInfo, RepositoryRef, TokenTransport};

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub provider implementation.
pub struct GitHubProvider {
    http_client: HttpClient,
    api_url: String,
    transport: TokenTransport,
}

impl GitHubProvider {
    /// Create from an existing HttpClient.
    pub fn from_http_client(
        http_client: HttpClient,
        api_url: &str,
        transport: TokenTransport,
    ) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    fn releases_url(&self, repo: &RepositoryRef) -> String {
        format!("{}/repos/{}/{}/releases", self.api_url, repo.owner, repo.name)
    }
}

#[async_trait]
impl Provider for GitHubProvider {
    fn api_url(&self) -> &str {
        &self.api_url
    }

    #[tracing::instrument(skip(self))]
    async fn list_releases(&self, repo: &RepositoryRef) -> Result<Vec<ReleaseInfo>, ResolveError> {
        let url = self.releases_url(repo);
        debug!(
            "Fetching releases of {} from {} (token: {})...",
            repo,
            url,
            match repo.access_token {
                Some(_) => self.transport.to_string(),
                None => "none".to_string(),
            }
        );

        let token = repo.access_token.as_deref();
        let body = match (token, self.transport) {
            (Some(token), TokenTransport::Query) => {
                self.http_client
                    .get_text(&url, &[("access_token", token)], None)
                    .await?
            }
            (Some(token), TokenTransport::Header) => {
                self.http_client.get_text(&url, &[], Some(token)).await?
            }
            (None, _) => self.http_client.get_text(&url, &[], None).await?,
        };

        decode_release_list(&body)
    }
}

/// Decode a release list response body.
///
/// An empty body, a non-array document and an empty array all mean there is
/// no release. A body that is not JSON, or an array whose first element is not
/// a release object, is malformed. Later elements that fail to decode are
/// skipped.
pub fn decode_release_list(body: &str) -> Result<Vec<ReleaseInfo>, ResolveError> {
    if body.trim().is_empty() {
        return Err(ResolveError::NoReleaseAvailable);
    }

    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ResolveError::MalformedReleasePayload(e.to_string()))?;

    match value {
        serde_json::Value::Array(items) if items.is_empty() => {
            Err(ResolveError::NoReleaseAvailable)
        }
        serde_json::Value::Array(items) => {
            let mut releases = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                match serde_json::from_value::<ReleaseInfo>(item) {
                    Ok(release) => releases.push(release),
                    Err(e) if index == 0 => {
                        return Err(ResolveError::MalformedReleasePayload(e.to_string()));
                    }
                    Err(e) => debug!("Skipping undecodable release #{}: {}", index, e),
                }
            }
            Ok(releases)
        }
        other => {
            debug!("Release list is not an array: {}", truncate(&other.to_string(), 120));
            Err(ResolveError::NoReleaseAvailable)
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
