//! Host-facing update checks.
//!
//! The host calls [`UpdateChecker::pre_update_check`] before it stores its
//! update list, [`UpdateChecker::resource_info`] when it shows a resource's
//! details, and [`UpdateChecker::on_demand_check`] when an update check is
//! triggered from outside.

mod types;

use std::sync::Arc;

use anyhow::Result;
use log::{debug, info, warn};

use crate::error::ResolveError;
use crate::provider::Provider;
use crate::resolver::{ReleaseResolver, ResolverOptions};
use crate::runtime::Runtime;
use crate::token::TokenStore;

pub use types::{
    CheckReport, CheckStatus, InfoSections, Resource, ResourceInfo, ResourceKind, UpdateOffer,
};

/// Literal answer of a successful on-demand check.
pub const ON_DEMAND_SUCCESS: &str = "success";

pub struct UpdateChecker<R: Runtime> {
    provider: Arc<dyn Provider>,
    options: ResolverOptions,
    default_token: Option<String>,
    tokens: TokenStore<R>,
}

impl<R: Runtime> UpdateChecker<R> {
    pub fn new(
        provider: Arc<dyn Provider>,
        options: ResolverOptions,
        default_token: Option<String>,
        tokens: TokenStore<R>,
    ) -> Self {
        Self {
            provider,
            options,
            default_token,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenStore<R> {
        &self.tokens
    }

    // A fresh resolver per resource and per call keeps memoization scoped to
    // one check.
    fn resolver_for(&self, resource: &Resource) -> Result<ReleaseResolver, ResolveError> {
        let token = resource
            .access_token
            .clone()
            .or_else(|| self.default_token.clone());
        ReleaseResolver::for_url(
            Arc::clone(&self.provider),
            &resource.homepage,
            token,
            self.options,
        )
    }

    /// Check every resource for a newer release.
    ///
    /// Resources are checked one after another; a failing resource is
    /// reported and the cycle continues.
    #[tracing::instrument(skip(self, resources))]
    pub async fn pre_update_check(&self, resources: &[Resource]) -> Vec<CheckReport> {
        let mut reports = Vec::with_capacity(resources.len());
        for resource in resources {
            let status = self.check_one(resource).await;
            reports.push(CheckReport {
                slug: resource.slug.clone(),
                status,
            });
        }
        reports
    }

    async fn check_one(&self, resource: &Resource) -> CheckStatus {
        let resolver = match self.resolver_for(resource) {
            Ok(resolver) => resolver,
            Err(_) => {
                debug!("{} is not hosted on GitHub: {}", resource.slug, resource.homepage);
                return CheckStatus::NotManaged;
            }
        };

        match resolver.resolve_update(&resource.installed_version).await {
            Ok(Some(update)) => CheckStatus::UpdateAvailable {
                offer: UpdateOffer {
                    slug: resource.slug.clone(),
                    new_version: update.version,
                    url: resource.homepage.clone(),
                    package: update.package_url,
                },
            },
            Ok(None) => CheckStatus::UpToDate,
            Err(err) => {
                warn!("Update check for {} failed: {}", resource.slug, err);
                CheckStatus::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Build the details record of a resource from its latest release.
    #[tracing::instrument(skip(self, resource), fields(slug = %resource.slug))]
    pub async fn resource_info(&self, resource: &Resource) -> Option<ResourceInfo> {
        let resolver = self.resolver_for(resource).ok()?;

        let details = match resolver.release_details().await {
            Ok(details) => details,
            Err(err) if err.is_no_release() => {
                debug!("No release details for {}: {}", resource.slug, err);
                return None;
            }
            Err(err) => {
                warn!("Failed to fetch release details for {}: {}", resource.slug, err);
                return None;
            }
        };

        Some(ResourceInfo {
            slug: resource.slug.clone(),
            name: resource.name.clone(),
            version: details.version.unwrap_or_default(),
            author: resource.author.clone(),
            homepage: resource.homepage.clone(),
            last_updated: details.published_at,
            download_link: details.download_url,
            sections: InfoSections {
                description: resource.description.clone(),
                changelog: details.changelog_html,
            },
            requires: details.min_required_version,
            tested: details.tested_up_to,
        })
    }

    /// Run an update check on behalf of an external caller.
    ///
    /// The presented token must equal the stored one; otherwise nothing is
    /// checked and [`crate::token::TokenError::Unauthorized`] is returned.
    #[tracing::instrument(skip(self, presented_token, resources))]
    pub async fn on_demand_check(
        &self,
        presented_token: &str,
        resources: &[Resource],
    ) -> Result<&'static str> {
        self.tokens.verify(presented_token)?;

        let reports = self.pre_update_check(resources).await;
        let offers = reports.iter().filter(|r| r.offer().is_some()).count();
        info!(
            "On-demand check finished: {} resources, {} updates",
            reports.len(),
            offers
        );
        Ok(ON_DEMAND_SUCCESS)
    }
}
