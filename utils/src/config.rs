use serde::{Deserialize, Serialize};

use crate::disk_storage::{DiskStorageInterface, FileFormat};

pub const ALCHEMY_API_KEY_ENV: &str = "ALCHEMY_API_KEY";
pub const INFURA_PROJECT_ID_ENV: &str = "WEB3_INFURA_PROJECT_ID";

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Config {
    pub current_network: Option<String>,
    pub alchemy_api_key: Option<String>,
    pub infura_project_id: Option<String>,
    /// Digits kept on each side of an abbreviated address, -1 disables it.
    #[serde(default = "default_abstract_digits")]
    pub abstract_digits: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            current_network: None,
            alchemy_api_key: None,
            infura_project_id: None,
            abstract_digits: default_abstract_digits(),
        }
    }
}

fn default_abstract_digits() -> i32 {
    4
}

impl DiskStorageInterface for Config {
    const FILE_NAME: &'static str = "config";
    const FORMAT: FileFormat = FileFormat::TOML;
}

impl Config {
    pub fn current_network() -> crate::Result<Option<String>> {
        Ok(Config::load()?.current_network)
    }

    pub fn set_current_network(network_name: String) -> crate::Result<()> {
        let mut config = Config::load()?;
        config.current_network = Some(network_name);
        config.save()
    }

    pub fn alchemy_api_key() -> crate::Result<String> {
        if let Some(key) = env_var(ALCHEMY_API_KEY_ENV) {
            return Ok(key);
        }
        Config::load()?
            .alchemy_api_key
            .ok_or(crate::Error::AlchemyApiKeyNotSet)
    }

    pub fn infura_project_id() -> crate::Result<String> {
        if let Some(id) = env_var(INFURA_PROJECT_ID_ENV) {
            return Ok(id);
        }
        Config::load()?
            .infura_project_id
            .ok_or(crate::Error::InfuraProjectIdNotSet)
    }

    /// `abstract_digits` as taken by `abstract_address`.
    pub fn digits(&self) -> Option<usize> {
        parse_digits(self.abstract_digits)
    }
}

/// Negative digit counts mean full addresses.
pub fn parse_digits(digits: i32) -> Option<usize> {
    usize::try_from(digits).ok()
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config = Config::parse(
            PathBuf::from("config.toml"),
            "current_network = \"Mainnet\"\nalchemy_api_key = \"abc\"\n",
        )
        .unwrap();

        assert_eq!(config.current_network.as_deref(), Some("Mainnet"));
        assert_eq!(config.alchemy_api_key.as_deref(), Some("abc"));
        assert_eq!(config.infura_project_id, None);
        assert_eq!(config.abstract_digits, 4);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse(PathBuf::from("config.toml"), "abstract_digits = \"four\"");
        assert!(matches!(result, Err(crate::Error::TomlParsingFailed(_, _))));
    }

    #[test]
    fn test_digits() {
        let mut config = Config::default();
        assert_eq!(config.digits(), Some(4));

        config.abstract_digits = -1;
        assert_eq!(config.digits(), None);
    }

    #[test]
    fn test_config_format_round_trips() {
        let config = Config {
            current_network: Some("Sepolia".to_string()),
            infura_project_id: Some("project".to_string()),
            ..Default::default()
        };
        let content = config.format().unwrap();
        assert_eq!(
            Config::parse(PathBuf::from("config.toml"), &content).unwrap(),
            config
        );
    }
}
