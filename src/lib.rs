pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::ApiConfig;
pub use crate::core::{
    api::{Api, ApiBuilder},
    dispatcher::{DispatchFailure, DispatchState, Dispatcher},
};
pub use domain::http::{Method, Request, Response};
pub use utils::error::{ApiError, Result};
