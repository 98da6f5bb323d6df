//! Diagnostic logging.
//!
//! Records are emitted through the `log` facade macros, re-exported here (`error!`, `warn!`,
//! `info!`, `debug!`, `trace!`), and written to stderr by a `log4rs` console appender, so they
//! never interleave with the results the binaries print on stdout. Nothing is logged until a
//! level is set.
//!
//! A global level applies to every module without a filter of its own. Module filters come from
//! a [`LogLevelSpec`], the parsed form of the binaries' `--log-level` argument:
//!
//! ```rust
//! use sirsim::log::{set_log_level, LevelFilter, LogLevelSpec};
//!
//! set_log_level(LevelFilter::Warn).unwrap();
//! // Trace every integration step.
//! let spec: LogLevelSpec = "sirsim::integrator=trace".parse().unwrap();
//! spec.apply().unwrap();
//! ```
mod console;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use crate::error::SirError;
use log4rs::Handle;

static LOGGER: LazyLock<Mutex<LoggerState>> = LazyLock::new(Mutex::default);

/// Level filters currently installed, plus the handle to reconfigure the installed logger.
struct LoggerState {
    level: LevelFilter,
    modules: BTreeMap<String, LevelFilter>,
    handle: Option<Handle>,
}

impl Default for LoggerState {
    fn default() -> Self {
        LoggerState {
            level: LevelFilter::Off,
            modules: BTreeMap::new(),
            handle: None,
        }
    }
}

impl LoggerState {
    /// Applies `change` and reinstalls the logger. The previous filters are restored if the new
    /// configuration is rejected.
    fn update<F: FnOnce(&mut Self)>(&mut self, change: F) -> Result<(), SirError> {
        let previous = (self.level, self.modules.clone());
        change(self);
        let result = self.install();
        if result.is_err() {
            (self.level, self.modules) = previous;
        }
        result
    }
}

fn logger_state() -> MutexGuard<'static, LoggerState> {
    LOGGER.lock().unwrap_or_else(PoisonError::into_inner)
}

fn validate_module(module: &str) -> Result<(), SirError> {
    let valid = module.split("::").all(|segment| {
        !segment.is_empty() && segment.chars().all(|c| c.is_alphanumeric() || c == '_')
    });
    if valid {
        Ok(())
    } else {
        Err(SirError::SirError(format!(
            "invalid module path \"{module}\" in log level"
        )))
    }
}

/// Sets the level for modules without their own filter. `LevelFilter::Off` silences them.
///
/// # Errors
///
/// Returns a `SirError` if the logger cannot be installed.
pub fn set_log_level(level: LevelFilter) -> Result<(), SirError> {
    logger_state().update(|state| state.level = level)
}

/// A parsed `--log-level` argument: an optional global level plus module filters.
#[derive(Debug, Default, PartialEq)]
pub struct LogLevelSpec {
    pub global: Option<LevelFilter>,
    pub modules: Vec<(String, LevelFilter)>,
}

impl FromStr for LogLevelSpec {
    type Err = SirError;

    /// Parses a comma separated list of `level` or `module=level` entries, e.g.
    /// `"info,sirsim::render=trace"`.
    fn from_str(spec: &str) -> Result<Self, SirError> {
        let parse_level = |level: &str| {
            LevelFilter::from_str(level.trim())
                .map_err(|_| SirError::SirError(format!("unknown log level \"{level}\"")))
        };
        let mut parsed = LogLevelSpec::default();
        for entry in spec.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            match entry.split_once('=') {
                Some((module, level)) => {
                    let module = module.trim();
                    validate_module(module)?;
                    parsed.modules.push((module.to_string(), parse_level(level)?));
                }
                None => parsed.global = Some(parse_level(entry)?),
            }
        }
        Ok(parsed)
    }
}

impl LogLevelSpec {
    /// Installs the levels in one reconfiguration. Without a global entry the global level is
    /// left as it is.
    ///
    /// # Errors
    ///
    /// Returns a `SirError` for a malformed module path or if the logger cannot be installed.
    pub fn apply(&self) -> Result<(), SirError> {
        for (module, _) in &self.modules {
            validate_module(module)?;
        }
        logger_state().update(|state| {
            if let Some(level) = self.global {
                state.level = level;
            }
            state.modules.extend(self.modules.iter().cloned());
        })
    }
}
