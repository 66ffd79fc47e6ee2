use crate::config::{LogColor, LogOutput, LoggingConfig};
use env_logger::{Builder, Env, Target, WriteStyle};
use log::SetLoggerError;

/// Builds the env_logger configuration. `RUST_LOG` overrides `config.level`.
pub fn logger_builder(config: &LoggingConfig) -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or(config.level.as_str()));

    builder.target(match config.output {
        LogOutput::Stdout => Target::Stdout,
        LogOutput::Stderr => Target::Stderr,
    });
    builder.write_style(match config.color {
        LogColor::Auto => WriteStyle::Auto,
        LogColor::Always => WriteStyle::Always,
        LogColor::Never => WriteStyle::Never,
    });

    builder
}

/// Installs the global logger. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), SetLoggerError> {
    logger_builder(config).try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = LoggingConfig {
            color: LogColor::Never,
            ..Default::default()
        };

        // Another test may have installed a logger already
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
