//! Diagnostic logging for simulation runs. This is separate from _reporting_: per-step counts are
//! written by [`crate::report`], while log messages describe what the model is doing.
//!
//! Every module logs through the `log` facade. Placement attempts are logged at `debug`/`trace`,
//! individual status transitions at `trace`, dropped moves at `debug`, and overlapping or
//! crowded agents found by the post-move checks at `error`.
//!
//! Logging is off until a level is set. The runner maps `--log-level <level>` to
//! [`set_log_level`] and each `--log-filter <module>=<level>` to a module filter:
//!
//! ```rust
//! use gridsir::log::{set_log_level, set_module_filters, LevelFilter};
//!
//! set_log_level(LevelFilter::Info);
//! // Every status transition, but no movement chatter.
//! set_module_filters(&[
//!     ("gridsir::model", LevelFilter::Trace),
//!     ("gridsir::movement", LevelFilter::Warn),
//! ]);
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};

use indexmap::IndexMap;
#[cfg(feature = "logging")]
use log4rs::Handle;
use std::str::FromStr;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// The global level plus per-module overrides, and the handle of the installed logger.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// Level for targets without a module filter. `LevelFilter::Off` disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    /// Module path (e.g. `"gridsir::placement"`) to its level.
    pub(in crate::log) module_levels: IndexMap<String, LevelFilter>,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: LevelFilter::Off,
            module_levels: IndexMap::new(),

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    fn set_module_filters(&mut self, module_filters: &[(&str, LevelFilter)]) {
        let mut mutated = false;
        for &(module, level) in module_filters {
            let previous = self.module_levels.insert(module.to_string(), level);
            mutated |= previous != Some(level);
        }
        // Rebuilding the log4rs config is not free; skip it when nothing changed.
        if mutated {
            self.set_config();
        }
    }
}

/// Sets the global log level. A global filter level of `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets level filters for module paths. Filters for other modules are kept.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    get_log_configuration().set_module_filters(module_filters);
}

/// Parses a `<module>=<level>` command line filter.
///
/// # Errors
///
/// Returns a message if there is no `=`, the module is empty, or the level is unknown.
pub fn parse_module_filter(filter: &str) -> Result<(String, LevelFilter), String> {
    let (module, level) = filter
        .split_once('=')
        .ok_or_else(|| format!("expected <module>=<level>, got `{filter}`"))?;
    if module.is_empty() {
        return Err(format!("missing module in `{filter}`"));
    }
    let level = LevelFilter::from_str(level).map_err(|_| format!("unknown level `{level}`"))?;
    Ok((module.to_string(), level))
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    // A panic while holding the lock leaves the configuration itself intact.
    LOG_CONFIGURATION
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{error, trace};

    // Force logging tests to run serially for consistent behavior.
    static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    #[test]
    fn test_set_log_level() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Error);
        {
            let config = get_log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Error);
            error!("test_set_log_level: global set to error");
            trace!("test_set_log_level: NOT EMITTED");
        }
        set_log_level(LevelFilter::Trace);
        {
            let config = get_log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Trace);
            assert_eq!(log::max_level(), LevelFilter::Trace);
        }
        set_log_level(LevelFilter::Off);
    }

    #[test]
    fn test_set_module_filters() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_module_filters(&[
            ("gridsir::log::tests::a", LevelFilter::Trace),
            ("gridsir::log::tests::b", LevelFilter::Warn),
        ]);
        set_module_filters(&[("gridsir::log::tests::b", LevelFilter::Debug)]);
        let config = get_log_configuration();
        assert_eq!(
            config.module_levels.get("gridsir::log::tests::a"),
            Some(&LevelFilter::Trace)
        );
        assert_eq!(
            config.module_levels.get("gridsir::log::tests::b"),
            Some(&LevelFilter::Debug)
        );
    }

    #[test]
    fn test_parse_module_filter() {
        assert_eq!(
            parse_module_filter("gridsir::movement=trace"),
            Ok(("gridsir::movement".to_string(), LevelFilter::Trace))
        );
        assert_eq!(
            parse_module_filter("gridsir=OFF"),
            Ok(("gridsir".to_string(), LevelFilter::Off))
        );
        assert!(parse_module_filter("gridsir::movement").is_err());
        assert!(parse_module_filter("=info").is_err());
        assert!(parse_module_filter("gridsir=loud").is_err());
    }
}
