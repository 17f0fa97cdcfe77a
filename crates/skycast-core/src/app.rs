use std::sync::Arc;

use crate::error::{AppError, ConfigError};
use crate::Config;

/// Application state and lifecycle manager
pub struct App {
    config: Arc<Config>,
}

impl App {
    /// Create a new application instance from the default config file
    pub fn new() -> Result<Self, AppError> {
        let config = Config::load().map_err(|e| ConfigError::ParseError(format!("{:#}", e)))?;
        Self::with_config(config)
    }

    /// Create an application instance from an already loaded config.
    ///
    /// Validation errors are fatal; warnings are logged.
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Ensure the data directory exists
    pub fn initialize(&mut self) -> Result<(), AppError> {
        tracing::info!(
            "Initializing application (data dir: {})",
            self.config.storage.data_dir.display()
        );

        std::fs::create_dir_all(&self.config.storage.data_dir)?;

        tracing::info!("Application initialized successfully");
        Ok(())
    }

    /// Shutdown the application
    pub fn shutdown(&mut self) -> Result<(), AppError> {
        tracing::info!("Shutting down application");
        Ok(())
    }

    /// Shared handle to the application config
    pub fn shared_config(&self) -> Arc<Config> {
        self.config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_config_rejects_invalid() {
        let mut config = Config::default();
        config.weather.forecast_days = 0;

        let result = App::with_config(config);
        assert!(matches!(result, Err(AppError::Config(ConfigError::Invalid(_)))));
    }

    #[test]
    fn test_initialize_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = dir.path().join("data");

        let mut app = App::with_config(config).unwrap();
        app.initialize().unwrap();

        assert!(dir.path().join("data").is_dir());
        assert!(app.shutdown().is_ok());
    }
}
