use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use super::LoggerState;
use crate::error::SirError;

// ISO 8601 timestamp, colored level, module path
const PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";
const APPENDER: &str = "stderr";

impl LoggerState {
    /// Builds a log4rs config from this state and installs it, initializing the global logger
    /// on first use.
    pub(super) fn install(&mut self) -> Result<(), SirError> {
        let console = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build();
        let builder =
            Config::builder().appender(Appender::builder().build(APPENDER, Box::new(console)));
        let config = self
            .modules
            .iter()
            .fold(builder, |builder, (module, level)| {
                builder.logger(Logger::builder().build(module.as_str(), *level))
            })
            .build(Root::builder().appender(APPENDER).build(self.level))
            .map_err(|e| SirError::SirError(format!("invalid logging configuration: {e}")))?;

        if let Some(handle) = &self.handle {
            handle.set_config(config);
        } else {
            let handle = log4rs::init_config(config)
                .map_err(|e| SirError::SirError(format!("cannot install logger: {e}")))?;
            self.handle = Some(handle);
        }
        Ok(())
    }
}
