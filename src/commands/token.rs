use anyhow::Result;

use crate::{runtime::Runtime, token::TokenStore};

use super::GlobalOptions;

/// Print the update-check token, generating it on first use.
#[tracing::instrument(skip(runtime, global))]
pub fn token<R: Runtime>(runtime: R, global: &GlobalOptions) -> Result<String> {
    let config = global.load_config(&runtime)?;
    let state_dir = global.state_dir(&runtime, &config)?;
    TokenStore::new(runtime, &state_dir).ensure_token()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use tempfile::tempdir;

    #[test]
    fn test_token_is_stable() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "{}").unwrap();
        let global = GlobalOptions {
            config_path: Some(config_path),
            api_url: None,
            state_dir: Some(dir.path().join("state")),
        };

        let first = token(RealRuntime, &global).unwrap();
        let second = token(RealRuntime, &global).unwrap();
        assert_eq!(first, second);
        assert!(dir.path().join("state").join("update-check.token").exists());
    }
}
