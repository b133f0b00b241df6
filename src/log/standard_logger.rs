use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::runtime::ConfigBuilder;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use crate::log::LogConfiguration;

// Use an ISO 8601 timestamp format and color coded level tag
const DEFAULT_LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";

impl LogConfiguration {
    /// Sets the global logger to conform to this [`LogConfiguration`].
    pub(in crate::log) fn set_config(&mut self) {
        let encoder = Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN));
        // Stdout is kept for the summary row printed by the binary.
        let stderr: ConsoleAppender = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(encoder)
            .build();
        let mut config: ConfigBuilder =
            Config::builder().appender(Appender::builder().build("stderr", Box::new(stderr)));

        for (module, &level) in &self.module_levels {
            config = config.logger(Logger::builder().build(module.clone(), level));
        }

        // The `Root` determines the global log level
        let root = Root::builder()
            .appender("stderr")
            .build(self.global_log_level);
        let new_config = match config.build(root) {
            Err(e) => {
                panic!("failed to build config: {e}");
            }
            Ok(config) => config,
        };

        match self.root_handle {
            Some(ref mut handle) => {
                handle.set_config(new_config);
            }
            None => match log4rs::init_config(new_config) {
                Ok(handle) => self.root_handle = Some(handle),
                // Another logger was installed first; honor the level through the facade.
                Err(_) => log::set_max_level(self.global_log_level),
            },
        }
    }
}
