use anyhow::Result;
use std::path::PathBuf;

use crate::runtime::Runtime;

mod check;
pub mod config;
mod info;
mod paths;
mod run;
pub mod services;
mod token;

pub use check::{UP_TO_DATE, check};
pub use info::info;
pub use run::{run, trigger};
pub use token::token;

use config::Config;

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub state_dir: Option<PathBuf>,
}

impl GlobalOptions {
    /// Load the configuration and apply command-line overrides.
    pub fn load_config<R: Runtime>(&self, runtime: &R) -> Result<Config> {
        let mut config = Config::load(runtime, self.config_path.as_deref())?;
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        Ok(config)
    }

    pub fn state_dir<R: Runtime>(&self, runtime: &R, config: &Config) -> Result<PathBuf> {
        match &self.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => config.state_dir(runtime),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;

    #[test]
    fn test_api_url_override() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok(r#"{"api_url": "https://from-file"}"#.to_string()));
        runtime
            .expect_env_var()
            .returning(|_| Err(std::env::VarError::NotPresent));

        let mut global = GlobalOptions {
            config_path: Some(PathBuf::from("/etc/ghupd.json")),
            ..Default::default()
        };
        assert_eq!(global.load_config(&runtime).unwrap().api_url, "https://from-file");

        global.api_url = Some("http://localhost:8080".into());
        assert_eq!(
            global.load_config(&runtime).unwrap().api_url,
            "http://localhost:8080"
        );
    }

    #[test]
    fn test_state_dir_precedence() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_config_dir()
            .returning(|| Some(PathBuf::from("/home/user/.config")));

        let config = Config {
            state_dir: Some(PathBuf::from("/from/config")),
            ..Config::default()
        };
        let global = GlobalOptions {
            state_dir: Some(PathBuf::from("/from/cli")),
            ..Default::default()
        };
        assert_eq!(
            global.state_dir(&runtime, &config).unwrap(),
            PathBuf::from("/from/cli")
        );
        assert_eq!(
            GlobalOptions::default().state_dir(&runtime, &config).unwrap(),
            PathBuf::from("/from/config")
        );
        assert_eq!(
            GlobalOptions::default()
                .state_dir(&runtime, &Config::default())
                .unwrap(),
            PathBuf::from("/home/user/.config/ghupd")
        );
    }
}
