use slog::{o, Drain, FilterLevel, Logger};

/// Build the terminal logger used by the exporter binaries. `levels` takes
/// `slog-envlogger` filter directives such as `exporter_contracts=debug`.
pub fn logger(show_debug: bool) -> Logger {
    logger_with_levels(show_debug, None)
}

pub fn logger_with_levels(show_debug: bool, levels: Option<&str>) -> Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::LogBuilder::new(drain)
        .filter(
            None,
            if show_debug {
                FilterLevel::Debug
            } else {
                FilterLevel::Info
            },
        )
        .parse(levels.unwrap_or(""))
        .build();
    let drain = slog_async::Async::new(drain)
        .chan_size(20000)
        .build()
        .fuse();
    Logger::root(drain, o!())
}

/// A logger that drops everything. Useful in tests.
pub fn discard() -> Logger {
    Logger::root(slog::Discard, o!())
}
