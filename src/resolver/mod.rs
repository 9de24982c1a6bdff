//! Release resolution for a single repository.
//!
//! A [`ReleaseResolver`] fetches the repository's release list at most once,
//! picks the latest release and derives everything the host needs from it:
//! the update decision, the package URL, the changelog and the platform
//! version hints.

mod notes;
mod version;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use url::Url;

use crate::error::ResolveError;
use crate::provider::{Provider, ReleaseInfo, RepositoryRef, TokenTransport, parse_repository_ref};

pub use notes::{ChangelogPolicy, min_required_version, render_changelog, tested_up_to};
pub use version::{compare_versions, is_newer};

/// Which release of the list counts as the latest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseOrder {
    /// First release as listed by the provider.
    #[default]
    Listed,
    /// Release with the most recent `published_at`.
    Published,
}

/// Knobs that change how a release is turned into update metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResolverOptions {
    pub token_transport: TokenTransport,
    pub release_order: ReleaseOrder,
    pub changelog: ChangelogPolicy,
}

/// Update metadata for a release newer than the installed version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedUpdate {
    pub version: String,
    pub package_url: String,
    pub changelog_html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_required_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tested_up_to: Option<String>,
}

/// Everything known about the latest release, regardless of what is
/// installed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseDetails {
    pub version: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub download_url: String,
    pub changelog_html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_required_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tested_up_to: Option<String>,
}

/// Resolver bound to one repository.
///
/// The release list is fetched lazily and memoized for the lifetime of the
/// resolver. A failed fetch is not memoized.
pub struct ReleaseResolver {
    provider: Arc<dyn Provider>,
    repo: RepositoryRef,
    options: ResolverOptions,
    latest: OnceCell<ReleaseInfo>,
}

impl ReleaseResolver {
    pub fn new(provider: Arc<dyn Provider>, repo: RepositoryRef, options: ResolverOptions) -> Self {
        Self {
            provider,
            repo,
            options,
            latest: OnceCell::new(),
        }
    }

    /// Build a resolver from a resource homepage.
    pub fn for_url(
        provider: Arc<dyn Provider>,
        url: &str,
        access_token: Option<String>,
        options: ResolverOptions,
    ) -> Result<Self, ResolveError> {
        let repo = parse_repository_ref(url)
            .ok_or_else(|| ResolveError::InvalidRepositoryUrl(url.to_string()))?
            .with_access_token(access_token);
        Ok(Self::new(provider, repo, options))
    }

    pub fn repository(&self) -> &RepositoryRef {
        &self.repo
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Latest release of the repository, fetched on first use.
    #[tracing::instrument(skip(self), fields(repo = %self.repo))]
    pub async fn fetch_latest_release(&self) -> Result<&ReleaseInfo, ResolveError> {
        self.latest
            .get_or_try_init(|| async {
                let releases = self.provider.list_releases(&self.repo).await?;
                let latest = select_latest(releases, self.options.release_order)
                    .ok_or(ResolveError::NoReleaseAvailable)?;
                debug!(
                    "Latest release of {}: {}",
                    self.repo,
                    latest.tag_name.as_deref().unwrap_or("<untagged>")
                );
                Ok::<_, ResolveError>(latest)
            })
            .await
    }

    /// Package URL of a release: its first asset, or the source archive.
    pub fn resolve_download_url(&self, release: &ReleaseInfo) -> String {
        let url = match release.assets.first() {
            Some(asset) => asset.browser_download_url.clone(),
            None => release.zipball_url.clone(),
        };

        match (&self.repo.access_token, self.options.token_transport) {
            (Some(token), TokenTransport::Query) => append_access_token(&url, token),
            _ => url,
        }
    }

    /// Decide whether the latest release is newer than `installed_version`.
    ///
    /// Returns `Ok(None)` when there is nothing to update to, including when
    /// the provider has no usable release. Only network failures are errors.
    #[tracing::instrument(skip(self), fields(repo = %self.repo))]
    pub async fn resolve_update(
        &self,
        installed_version: &str,
    ) -> Result<Option<ResolvedUpdate>, ResolveError> {
        let release = match self.fetch_latest_release().await {
            Ok(release) => release,
            Err(err) if err.is_no_release() => {
                debug!("No usable release for {}: {}", self.repo, err);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let Some(tag) = release.tag_name.as_deref() else {
            debug!("Latest release of {} has no tag", self.repo);
            return Ok(None);
        };

        if !is_newer(tag, installed_version) {
            debug!("{} is up to date ({} >= {})", self.repo, installed_version, tag);
            return Ok(None);
        }

        info!("Update available for {}: {} -> {}", self.repo, installed_version, tag);
        Ok(Some(ResolvedUpdate {
            version: tag.to_string(),
            package_url: self.resolve_download_url(release),
            changelog_html: render_changelog(&release.body, self.options.changelog),
            min_required_version: min_required_version(&release.body),
            tested_up_to: tested_up_to(&release.body),
        }))
    }

    /// Details of the latest release, without any version comparison.
    #[tracing::instrument(skip(self), fields(repo = %self.repo))]
    pub async fn release_details(&self) -> Result<ReleaseDetails, ResolveError> {
        let release = self.fetch_latest_release().await?;
        Ok(ReleaseDetails {
            version: release.tag_name.clone(),
            published_at: release.published_at,
            download_url: self.resolve_download_url(release),
            changelog_html: render_changelog(&release.body, self.options.changelog),
            min_required_version: min_required_version(&release.body),
            tested_up_to: tested_up_to(&release.body),
        })
    }
}

/// Pick the latest release of a list.
///
/// With [`ReleaseOrder::Published`], releases without a timestamp never beat
/// one that has it, and ties keep the earlier-listed release.
pub fn select_latest(releases: Vec<ReleaseInfo>, order: ReleaseOrder) -> Option<ReleaseInfo> {
    match order {
        ReleaseOrder::Listed => releases.into_iter().next(),
        ReleaseOrder::Published => {
            let mut latest: Option<ReleaseInfo> = None;
            for release in releases {
                let newer = match &latest {
                    None => true,
                    Some(current) => match (release.published_at, current.published_at) {
                        (Some(candidate), Some(best)) => candidate > best,
                        (Some(_), None) => true,
                        (None, _) => false,
                    },
                };
                if newer {
                    latest = Some(release);
                }
            }
            latest
        }
    }
}

/// Add `access_token=<token>` to a URL, replacing any existing value.
pub fn append_access_token(url: &str, token: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        debug!("Package URL is not absolute, leaving it unchanged");
        return url.to_string();
    };

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| k != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("access_token", token);

    parsed.to_string()
}
