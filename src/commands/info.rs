use anyhow::{Context, Result};

use crate::{resolver::ReleaseResolver, runtime::Runtime};

use super::GlobalOptions;
use super::services::build_provider;

/// Details of the latest release of one repository, as pretty JSON.
#[tracing::instrument(skip(runtime, global, token))]
pub async fn info<R: Runtime>(
    runtime: &R,
    global: &GlobalOptions,
    url: &str,
    token: Option<String>,
) -> Result<String> {
    let config = global.load_config(runtime)?;
    let token = token.or_else(|| config.access_token.clone());
    let resolver = ReleaseResolver::for_url(build_provider(&config)?, url, token, config.resolver)?;

    let details = resolver
        .release_details()
        .await
        .with_context(|| format!("Failed to fetch releases of {}", resolver.repository()))?;
    Ok(serde_json::to_string_pretty(&details)?)
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

    #[tokio::test]
    async fn test_info_prints_release_details() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/widget/releases")
            .with_status(200)
            .with_body(
                r#"[{
                    "tag_name": "2.0.0",
                    "published_at": "2024-02-01T00:00:00Z",
                    "body": "Tested: 6.0\n\n**bold**",
                    "assets": [{"name": "w.zip", "browser_download_url": "A"}]
                }]"#,
            )
            .create_async()
            .await;

        let global = GlobalOptions {
            config_path: Some("/etc/ghupd.json".into()),
            api_url: Some(server.url()),
            state_dir: None,
        };
        let output = info(&runtime(), &global, "https://github.com/acme/widget", None)
            .await
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["version"], "2.0.0");
        assert_eq!(value["download_url"], "A");
        assert_eq!(value["tested_up_to"], "6.0");
        assert!(value["changelog_html"].as_str().unwrap().contains("<strong>bold</strong>"));
    }

    #[tokio::test]
    async fn test_info_without_releases_fails() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/widget/releases")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let global = GlobalOptions {
            config_path: Some("/etc/ghupd.json".into()),
            api_url: Some(server.url()),
            state_dir: None,
        };
        let err = info(&runtime(), &global, "https://github.com/acme/widget", None)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("No release available"));
    }
}
