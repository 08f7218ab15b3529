use thiserror::Error;

use crate::abi::AbiMismatch;

/// Everything that can go wrong while resolving contract configuration.
///
/// None of these are recoverable at runtime; callers are expected to abort
/// startup when they see one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find configuration file `{path}`")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse configuration file `{path}`")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("no configuration value set for key: \"{0}\"")]
    MissingKey(String),
    #[error("configuration value for key \"{key}\" is not {expected}")]
    WrongType { key: String, expected: &'static str },
    #[error("invalid value for key \"{key}\": {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("failed to expand environment variables in \"{key}\": {reason}")]
    Expand { key: String, reason: String },
    #[error("no contracts configured for transformer: \"{0}\"")]
    NoTransformerContracts(String),
    #[error("no ABI configured for contract: \"{0}\"")]
    MissingAbi(String),
    #[error("no contracts supplied")]
    NoContracts,
    #[error("unable to parse ABI for {contract}")]
    InvalidAbi {
        contract: String,
        #[source]
        source: ethabi::Error,
    },
    #[error("ABIs don't match for contracts: {first} and {other}. Reason: {reason}")]
    AbiMismatch {
        first: String,
        other: String,
        reason: AbiMismatch,
    },
    #[error("failed to render configuration as JSON")]
    Json(#[from] serde_json::Error),
}
