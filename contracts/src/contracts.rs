//! Typed access to contract and transformer metadata.
//!
//! Transformer definitions name the contracts they index:
//!
//! ```toml
//! [exporter.vow_file]
//! path = "transformers/events/vow_file/initializer"
//! type = "eth_event"
//! contracts = ["MCD_VOW"]
//!
//! [contract.MCD_VOW]
//! address = "0xA950524441892A31ebddF91d3cEEFa04Bf454466"
//! abi = '[{"type":"function", ...}]'
//! deployed = 8928163
//! ```
//!
//! [`ContractConfig`] resolves these settings. Every lookup that finds
//! nothing usable returns a [`ConfigError`]; the process entry point is
//! responsible for refusing to start when that happens.

use std::path::PathBuf;

use ethabi::Contract;
use once_cell::sync::OnceCell;
use slog::{debug, info, o, Logger};

use crate::abi::{compare_abi, AbiCheck};
use crate::config::{get_segment, ConfigSource, ConfigTree, FileSource};
use crate::errors::ConfigError;
use crate::BlockNumber;

/// Storage-level marker for a contract whose deployment block is unknown
const UNKNOWN_DEPLOYMENT_BLOCK: BlockNumber = -1;

/// Everything a transformer needs to know about the contracts it indexes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransformerConfig {
    pub label: String,
    pub contracts: Vec<String>,
    pub addresses: Vec<String>,
    pub abi: String,
    pub starting_block: BlockNumber,
}

/// Resolves contract settings from a configuration tree that is loaded
/// lazily, exactly once, on first use.
pub struct ContractConfig {
    logger: Logger,
    source: Box<dyn ConfigSource>,
    tree: OnceCell<ConfigTree>,
    abi_check: AbiCheck,
}

impl ContractConfig {
    pub fn new(logger: &Logger, source: impl ConfigSource + 'static) -> Self {
        ContractConfig {
            logger: logger.new(o!("component" => "ContractConfig")),
            source: Box::new(source),
            tree: OnceCell::new(),
            abi_check: AbiCheck::default(),
        }
    }

    pub fn from_file(logger: &Logger, path: impl Into<PathBuf>) -> Self {
        Self::new(logger, FileSource::new(path))
    }

    /// Choose how strictly [`matching_abi_for_contracts`] compares ABIs.
    ///
    /// [`matching_abi_for_contracts`]: ContractConfig::matching_abi_for_contracts
    pub fn with_abi_check(mut self, abi_check: AbiCheck) -> Self {
        self.abi_check = abi_check;
        self
    }

    /// Load the configuration tree if that has not happened yet. Concurrent
    /// callers wait for a single load; a failed load is retried on the next
    /// call.
    pub fn initialize(&self) -> Result<&ConfigTree, ConfigError> {
        self.tree.get_or_try_init(|| {
            let root = self.source.load()?;
            info!(self.logger, "Using config file"; "source" => self.source.describe());
            Ok(ConfigTree::new(root))
        })
    }

    pub fn get_string(&self, key: &str) -> Result<String, ConfigError> {
        self.initialize()?.get_string(key)
    }

    /// Contract names from `exporter.<label>.contracts`, in configured order.
    pub fn transformer_contract_names(&self, label: &str) -> Result<Vec<String>, ConfigError> {
        let key = format!("exporter.{}.contracts", label);
        let contracts = self.initialize()?.get_string_list(&key)?;
        if contracts.is_empty() {
            return Err(ConfigError::NoTransformerContracts(label.to_string()));
        }
        Ok(contracts)
    }

    /// Labels of all transformers that declare contracts, sorted
    pub fn transformer_labels(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self
            .initialize()?
            .child_tables("exporter")
            .into_iter()
            .filter(|(_, table)| get_segment(table, "contracts").is_some())
            .map(|(label, _)| label.to_string())
            .collect())
    }

    /// The raw JSON ABI configured for `contract`, exactly as written.
    pub fn contract_abi(&self, contract: &str) -> Result<String, ConfigError> {
        match self.initialize()?.get_raw_string(&contract_key(contract, "abi")) {
            Err(ConfigError::MissingKey(_)) => Err(ConfigError::MissingAbi(contract.to_string())),
            other => other,
        }
    }

    pub fn parsed_abi(&self, contract: &str) -> Result<Contract, ConfigError> {
        let abi = self.contract_abi(contract)?;
        parse_abi(contract, &abi)
    }

    /// The ABI shared by all `contracts`. A single transformer may run
    /// against many contracts, so every contract's ABI is checked against
    /// the first one's before the first one's raw ABI is returned.
    pub fn matching_abi_for_contracts<S: AsRef<str>>(
        &self,
        contracts: &[S],
    ) -> Result<String, ConfigError> {
        let (first, rest) = contracts.split_first().ok_or(ConfigError::NoContracts)?;
        let first = first.as_ref();
        let abi = self.contract_abi(first)?;
        let parsed = parse_abi(first, &abi)?;
        for other in rest {
            let other = other.as_ref();
            let other_abi = self.parsed_abi(other)?;
            compare_abi(&parsed, &other_abi, self.abi_check).map_err(|reason| {
                ConfigError::AbiMismatch {
                    first: first.to_string(),
                    other: other.to_string(),
                    reason,
                }
            })?;
            debug!(self.logger, "Contract ABIs match"; "contract" => first, "other" => other);
        }
        Ok(abi)
    }

    /// The raw ABI of the first of `contracts`, without comparing it to the
    /// others.
    pub fn first_abi<S: AsRef<str>>(&self, contracts: &[S]) -> Result<String, ConfigError> {
        let first = contracts.first().ok_or(ConfigError::NoContracts)?;
        self.contract_abi(first.as_ref())
    }

    /// The earliest deployment block of `contracts`. Contracts without a
    /// configured deployment block count as deployed at block 0.
    pub fn min_deployment_block<S: AsRef<str>>(
        &self,
        contracts: &[S],
    ) -> Result<BlockNumber, ConfigError> {
        if contracts.is_empty() {
            return Err(ConfigError::NoContracts);
        }
        let mut min_block = BlockNumber::MAX;
        for contract in contracts {
            min_block = min_block.min(self.deployment_block(contract.as_ref())?);
        }
        Ok(min_block)
    }

    fn deployment_block(&self, contract: &str) -> Result<BlockNumber, ConfigError> {
        match self.initialize()?.get_i64(&contract_key(contract, "deployed"))? {
            None | Some(UNKNOWN_DEPLOYMENT_BLOCK) => {
                info!(
                    self.logger,
                    "No deployment block configured for contract, defaulting to 0";
                    "contract" => contract
                );
                Ok(0)
            }
            Some(block) => Ok(block),
        }
    }

    /// One address per contract, in the order of `contracts`.
    pub fn contract_addresses<S: AsRef<str>>(
        &self,
        contracts: &[S],
    ) -> Result<Vec<String>, ConfigError> {
        if contracts.is_empty() {
            return Err(ConfigError::NoContracts);
        }
        contracts
            .iter()
            .map(|contract| self.contract_address(contract.as_ref()))
            .collect()
    }

    pub fn contract_address(&self, contract: &str) -> Result<String, ConfigError> {
        self.get_string(&contract_key(contract, "address"))
    }

    /// Resolve everything an event transformer labelled `label` is
    /// initialized with.
    pub fn transformer_config(&self, label: &str) -> Result<TransformerConfig, ConfigError> {
        let contracts = self.transformer_contract_names(label)?;
        let abi = self.matching_abi_for_contracts(&contracts)?;
        let addresses = self.contract_addresses(&contracts)?;
        let starting_block = self.min_deployment_block(&contracts)?;
        Ok(TransformerConfig {
            label: label.to_string(),
            contracts,
            addresses,
            abi,
            starting_block,
        })
    }

    /// Generate a JSON representation of the loaded configuration.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        self.initialize()?.to_json()
    }
}

fn contract_key(contract: &str, setting: &str) -> String {
    format!("contract.{}.{}", contract, setting)
}

fn parse_abi(contract: &str, abi: &str) -> Result<Contract, ConfigError> {
    Contract::load(abi.as_bytes()).map_err(|source| ConfigError::InvalidAbi {
        contract: contract.to_string(),
        source,
    })
}
