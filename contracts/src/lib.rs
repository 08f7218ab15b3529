#[macro_use]
extern crate serde_derive;
pub extern crate ethabi;
pub extern crate slog;

/// Structural comparison of contract ABIs.
pub mod abi;

/// Loading and querying the hierarchical configuration tree.
pub mod config;

/// Typed lookups of contract and transformer metadata.
pub mod contracts;

/// Error types shared by the configuration accessors.
pub mod errors;

/// Logger construction.
pub mod log;

/// A block number as written in the `contract.<name>.deployed` setting.
pub type BlockNumber = i64;

/// A prelude that makes the accessor, the comparator and their errors
/// available at once.
///
/// ```
/// use exporter_contracts::prelude::*;
/// ```
pub mod prelude {
    pub use ethabi::Contract;
    pub use slog::{self, crit, debug, error, info, o, trace, warn, Logger};

    pub use crate::abi::{compare_contract_abi, AbiCheck, AbiMismatch};
    pub use crate::config::{ConfigSource, ConfigTree, FileSource};
    pub use crate::contracts::{ContractConfig, TransformerConfig};
    pub use crate::errors::ConfigError;
    pub use crate::BlockNumber;
}
