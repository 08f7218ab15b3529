use clap::Parser as _;

use exporter_contracts::log::logger_with_levels;
use exporter_node::{launcher, opt};

fn main() {
    let opt = opt::Opt::parse();

    // Set up logger
    let logger = logger_with_levels(opt.debug, opt.log_levels.as_deref());

    let result = if opt.check_config {
        let config = launcher::contract_config(&logger, &opt);
        launcher::check_config(&logger, &config)
    } else {
        launcher::run(&logger, &opt)
    };

    // The async drain only flushes once the last logger handle is gone
    drop(logger);

    match result {
        Ok(txt) => {
            println!("{}", txt);
            if opt.check_config {
                eprintln!("Successfully validated configuration");
            }
        }
        Err(e) => {
            eprintln!("configuration error: {:#}", e);
            std::process::exit(1);
        }
    }
}
