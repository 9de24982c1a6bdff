use anyhow::{Context, Result};
use log::debug;

use crate::{resolver::ReleaseResolver, runtime::Runtime};

use super::GlobalOptions;
use super::services::build_provider;

/// Message printed when the installed version is current.
pub const UP_TO_DATE: &str = "up to date";

/// Resolve one repository against an installed version.
///
/// Returns the update as pretty JSON, or [`UP_TO_DATE`].
#[tracing::instrument(skip(runtime, global, token))]
pub async fn check<R: Runtime>(
    runtime: &R,
    global: &GlobalOptions,
    url: &str,
    installed_version: &str,
    token: Option<String>,
) -> Result<String> {
    let config = global.load_config(runtime)?;
    let token = token.or_else(|| config.access_token.clone());
    let resolver = ReleaseResolver::for_url(build_provider(&config)?, url, token, config.resolver)?;

    debug!("Checking {} against {}", resolver.repository(), installed_version);
    match resolver
        .resolve_update(installed_version)
        .await
        .with_context(|| format!("Failed to check {} for updates", resolver.repository()))?
    {
        Some(update) => Ok(serde_json::to_string_pretty(&update)?),
        None => Ok(UP_TO_DATE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockito::Server;

    fn runtime() -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .returning(|_| Err(std::env::VarError::NotPresent));
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("{}".to_string()));
        runtime
    }

    fn global(api_url: String) -> GlobalOptions {
        GlobalOptions {
            config_path: Some("/etc/ghupd.json".into()),
            api_url: Some(api_url),
            state_dir: None,
        }
    }

    #[tokio::test]
    async fn test_check_update_available() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/widget/releases")
            .with_status(200)
            .with_body(r#"[{"tag_name": "1.3.0", "body": "Requires: 5.2", "zipball_url": "Z"}]"#)
            .create_async()
            .await;

        let output = check(
            &runtime(),
            &global(server.url()),
            "https://github.com/acme/widget",
            "1.2.0",
            None,
        )
        .await
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["version"], "1.3.0");
        assert_eq!(value["package_url"], "Z");
        assert_eq!(value["min_required_version"], "5.2");
    }

    #[tokio::test]
    async fn test_check_up_to_date() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/widget/releases")
            .with_status(200)
            .with_body(r#"[{"tag_name": "1.2.0"}]"#)
            .create_async()
            .await;

        let output = check(
            &runtime(),
            &global(server.url()),
            "https://github.com/acme/widget",
            "1.2.0",
            None,
        )
        .await
        .unwrap();
        assert_eq!(output, UP_TO_DATE);
    }

    #[tokio::test]
    async fn test_check_rejects_non_github_url() {
        let err = check(
            &runtime(),
            &global("http://127.0.0.1:9".into()),
            "https://gitlab.com/acme/widget",
            "1.0.0",
            None,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Not a GitHub repository URL"));
    }
}
