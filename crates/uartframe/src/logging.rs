use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Crates whose events follow `--log-level`. Everything else (serialport,
/// ctrlc) is capped at `warn` so a debug session shows framing activity only.
const OWN_TARGETS: [&str; 3] = ["uartframe", "uartframe_frame", "uartframe_transport"];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn log_targets(level: LogLevel) -> Targets {
    let own = level.as_filter();
    OWN_TARGETS
        .iter()
        .fold(Targets::new(), |targets, name| targets.with_target(*name, own))
        .with_default(own.min(LevelFilter::WARN))
}

/// Install the stderr subscriber. Stdout stays reserved for packet output.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);
    let registry = tracing_subscriber::registry().with(log_targets(level));

    match format {
        LogFormat::Text => {
            let _ = registry.with(layer).try_init();
        }
        LogFormat::Json => {
            let _ = registry.with(layer.json()).try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn own_crates_follow_requested_level() {
        let targets = log_targets(LogLevel::Debug);
        assert!(targets.would_enable("uartframe_frame::decoder", &Level::DEBUG));
        assert!(targets.would_enable("uartframe_transport::serial", &Level::DEBUG));
        assert!(targets.would_enable("uartframe::cmd::listen", &Level::DEBUG));
        assert!(!targets.would_enable("uartframe_frame::decoder", &Level::TRACE));
    }

    #[test]
    fn dependencies_are_capped_at_warn() {
        let targets = log_targets(LogLevel::Trace);
        assert!(targets.would_enable("serialport::posix", &Level::WARN));
        assert!(!targets.would_enable("serialport::posix", &Level::DEBUG));

        let quiet = log_targets(LogLevel::Error);
        assert!(!quiet.would_enable("serialport::posix", &Level::WARN));
        assert!(quiet.would_enable("serialport::posix", &Level::ERROR));
    }
}
