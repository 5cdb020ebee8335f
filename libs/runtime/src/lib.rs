//! Process runtime: layered configuration and logging bootstrap.

pub mod config;
pub mod logging;

pub use config::{
    default_logging_config, AppConfig, CliArgs, LogSection, LoggingConfig, ModuleConfigError,
    ServerConfig,
};
