use anyhow::Result;
use log::info;

use crate::runtime::Runtime;

use super::GlobalOptions;
use super::services::build_checker;

/// Check every configured resource and return the reports as pretty JSON.
#[tracing::instrument(skip(runtime, global))]
pub async fn run<R: Runtime>(runtime: R, global: &GlobalOptions) -> Result<String> {
    let config = global.load_config(&runtime)?;
    let state_dir = global.state_dir(&runtime, &config)?;
    info!("Checking {} configured resources", config.resources.len());

    let checker = build_checker(runtime, &config, &state_dir)?;
    let reports = checker.pre_update_check(&config.resources).await;
    Ok(serde_json::to_string_pretty(&reports)?)
}

/// On-demand check authorized by the stored token.
#[tracing::instrument(skip(runtime, global, token))]
pub async fn trigger<R: Runtime>(runtime: R, global: &GlobalOptions, token: &str) -> Result<String> {
    let config = global.load_config(&runtime)?;
    let state_dir = global.state_dir(&runtime, &config)?;

    let checker = build_checker(runtime, &config, &state_dir)?;
    let answer = checker.on_demand_check(token, &config.resources).await?;
    Ok(answer.to_string())
}
