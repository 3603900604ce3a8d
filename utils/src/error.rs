use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, UtilsError>;

#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    #[error("Address '{0}' is not a valid Ethereum address.")]
    InvalidAddress(String),

    #[error("Network not found: {0}.")]
    NetworkNotFound(String),

    #[error("Rpc URL not found for network {network} with chain id {chain_id}. Please add it in the networks.")]
    RpcUrlNotFound { network: String, chain_id: u32 },

    #[error("Failed to parse URL: {0}. (Error: {1:?})")]
    UrlParsingFailed(String, url::ParseError),

    #[error("Alchemy API key not set, please set ALCHEMY_API_KEY or add it to the config.")]
    AlchemyApiKeyNotSet,

    #[error("Infura project id not set, please set WEB3_INFURA_PROJECT_ID or add it to the config.")]
    InfuraProjectIdNotSet,

    #[error("Failed to get base directories.")]
    BaseDirsFailed,

    #[error("Failed to create directory: {0:?}. (Error: {1:?})")]
    CreateDirAllFailed(PathBuf, std::io::Error),

    #[error("Failed to read the file: {0}. (Error: {1:?})")]
    FileReadFailed(PathBuf, std::io::Error),

    #[error("Failed to write to the file: {0}. (Error: {1:?})")]
    FileWriteFailed(PathBuf, std::io::Error),

    #[error("Parsing the toml file failed: {0}. (Error: {1:?})")]
    TomlParsingFailed(PathBuf, toml::de::Error),

    #[error("Formatting to toml format failed: {0}. (Error: {1:?})")]
    TomlFormattingFailed(String, toml::ser::Error),

    #[error("Parsing the yaml file failed: {0}. (Error: {1:?})")]
    YamlParsingFailed(PathBuf, serde_yaml::Error),

    #[error("Formatting to yaml format failed: {0}. (Error: {1:?})")]
    YamlFormattingFailed(String, serde_yaml::Error),
}
