use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration for the CLI.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub default_level: tracing::Level,
    pub show_targets: bool,
    pub show_thread_ids: bool,
    pub show_logs: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: tracing::Level::INFO,
            show_targets: true,
            show_thread_ids: false,
            show_logs: true,
        }
    }
}

impl LogConfig {
    /// Development configuration (verbose, human-readable).
    pub fn dev() -> Self {
        Self {
            default_level: tracing::Level::DEBUG,
            show_thread_ids: true,
            ..Default::default()
        }
    }

    /// Script/demo mode: keep library logs off the board output unless the
    /// environment asks for them.
    pub fn quiet() -> Self {
        Self {
            default_level: tracing::Level::WARN,
            ..Default::default()
        }
    }

    /// Hide logs entirely.
    pub fn without_logs(mut self) -> Self {
        self.show_logs = false;
        self
    }

    pub fn init(self) -> Result<(), String> {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}", self.default_level).to_lowercase())
        });

        if self.show_logs {
            let fmt_layer = fmt::layer()
                .with_target(self.show_targets)
                .with_thread_ids(self.show_thread_ids);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .map_err(|e| format!("Failed to initialize tracing: {}", e))
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .try_init()
                .map_err(|e| format!("Failed to initialize tracing: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.default_level, tracing::Level::INFO);
        assert!(config.show_logs);
        assert!(!config.show_thread_ids);
    }

    #[test]
    fn test_dev_config() {
        let config = LogConfig::dev();
        assert_eq!(config.default_level, tracing::Level::DEBUG);
        assert!(config.show_thread_ids);
    }

    #[test]
    fn test_quiet_config() {
        let config = LogConfig::quiet();
        assert_eq!(config.default_level, tracing::Level::WARN);
    }

    #[test]
    fn test_without_logs() {
        let config = LogConfig::default().without_logs();
        assert!(!config.show_logs);
    }
}
