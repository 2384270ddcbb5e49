pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::ServerArgs;
pub use config::ServiceConfig;

pub use adapters::OpenAiClient;
pub use app::{create_router, AppState};
pub use crate::core::cleanup::clean_diagram;
pub use utils::error::{Result, ServiceError};
