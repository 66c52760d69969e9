pub mod toml_config;

pub use toml_config::ApiConfig;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

#[cfg(feature = "cli")]
pub mod cli;
