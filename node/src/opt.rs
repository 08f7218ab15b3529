use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[clap(
    name = "exporter-node",
    about = "Resolve and validate the contracts behind transformer jobs",
    version
)]
pub struct Opt {
    #[clap(
        long,
        env = "EXPORTER_CONFIG",
        value_name = "FILE",
        help = "the name of the configuration file"
    )]
    pub config: String,
    #[clap(long, help = "validate the configuration and exit")]
    pub check_config: bool,
    #[clap(
        long = "transformer",
        value_name = "LABEL",
        help = "label of a transformer to resolve; can be repeated. Defaults to every \
                transformer that declares contracts"
    )]
    pub transformers: Vec<String>,
    #[clap(
        long,
        help = "also reject ABIs that define methods or events the first contract lacks"
    )]
    pub strict_abi: bool,
    #[clap(long, help = "Enable debug logging")]
    pub debug: bool,
    #[clap(
        long,
        env = "EXPORTER_LOG",
        value_name = "FILTER",
        help = "slog-envlogger filter directives, e.g. `exporter_contracts=debug`"
    )]
    pub log_levels: Option<String>,
}
