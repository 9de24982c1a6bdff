//! Service factory for building command dependencies.
//!
//! Construction of the provider stack and the checker is kept apart from the
//! configuration: services are built from configuration values but are not
//! part of it.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use log::debug;

use crate::{
    checker::UpdateChecker,
    http::build_http_client,
    provider::{CachingProvider, GitHubProvider, Provider},
    runtime::Runtime,
    token::TokenStore,
};

use super::config::Config;

/// Build the GitHub provider, wrapped in the release cache.
pub fn build_provider(config: &Config) -> Result<Arc<dyn Provider>> {
    let http_client = build_http_client(&config.http_options())?;
    let github = GitHubProvider::from_http_client(
        http_client,
        &config.api_url,
        config.resolver.token_transport,
    );
    debug!(
        "Provider: {} (token transport: {}, cache ttl: {}s)",
        config.api_url, config.resolver.token_transport, config.cache_ttl_secs
    );
    Ok(Arc::new(CachingProvider::new(github, config.cache_ttl())))
}

pub fn build_checker<R: Runtime>(
    runtime: R,
    config: &Config,
    state_dir: &Path,
) -> Result<UpdateChecker<R>> {
    Ok(UpdateChecker::new(
        build_provider(config)?,
        config.resolver,
        config.access_token.clone(),
        TokenStore::new(runtime, state_dir),
    ))
}
