use anyhow::{Context, Result};
use exporter_contracts::prelude::*;

use crate::opt::Opt;

/// Build the accessor described by the command line. Nothing is read from
/// disk until the first lookup.
pub fn contract_config(logger: &Logger, opt: &Opt) -> ContractConfig {
    let abi_check = if opt.strict_abi {
        AbiCheck::Exact
    } else {
        AbiCheck::Subset
    };
    ContractConfig::from_file(logger, &opt.config).with_abi_check(abi_check)
}

/// Resolve the transformers named by `labels`, or every transformer that
/// declares contracts if `labels` is empty.
pub fn resolve_transformers(
    logger: &Logger,
    config: &ContractConfig,
    labels: &[String],
) -> Result<Vec<TransformerConfig>> {
    let labels = if labels.is_empty() {
        config.transformer_labels()?
    } else {
        labels.to_vec()
    };

    labels
        .iter()
        .map(|label| -> Result<TransformerConfig> {
            let transformer = config
                .transformer_config(label)
                .with_context(|| format!("failed to resolve transformer `{}`", label))?;
            info!(logger, "Resolved transformer contracts";
                "transformer" => label,
                "contracts" => transformer.contracts.join(","),
                "starting_block" => transformer.starting_block);
            Ok(transformer)
        })
        .collect()
}

/// Load the configuration, make sure every transformer in it resolves and
/// return the configuration as JSON.
pub fn check_config(logger: &Logger, config: &ContractConfig) -> Result<String> {
    let json = config.to_json()?;
    let transformers = resolve_transformers(logger, config, &[])?;
    info!(logger, "Checked transformers"; "count" => transformers.len());
    Ok(json)
}

/// Resolve the transformers requested in `opt` and render them as JSON.
pub fn run(logger: &Logger, opt: &Opt) -> Result<String> {
    let config = contract_config(logger, opt);
    let transformers = resolve_transformers(logger, &config, &opt.transformers)?;
    Ok(serde_json::to_string_pretty(&transformers)?)
}
