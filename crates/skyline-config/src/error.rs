use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error(
        "SoftLayer credentials are not configured. Set softlayer.username and \
        softlayer.api_key in the config file, or SL_USERNAME and SL_API_KEY"
    )]
    MissingSoftLayerCredentials,

    #[error(
        "OpenWhisk credentials are not configured. Set openwhisk.auth_key \
        (or OW_AUTH_KEY), or bluemix.api_key (or BM_API_KEY) to look it up"
    )]
    MissingWhiskCredentials,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
