//! ragbridge-core: bridge between real-time clients and a hosted assistant
//!
//! This crate provisions an assistant with a file-search knowledge corpus
//! (exactly once per corpus), tracks process readiness, and runs each inbound
//! client message through a thread/run lifecycle against the hosted backend.

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod gate;
pub mod models;
pub mod openai;
pub mod pipeline;
pub mod poll;
pub mod sanitize;
pub mod setup;

pub use config::Config;
pub use dispatch::Dispatcher;
pub use error::Error;
pub use error::Result;
pub use gate::ReadinessGate;
pub use openai::OpenAiClient;
pub use pipeline::RequestPipeline;
pub use setup::SetupCoordinator;

/// Application name used for config directories and paths.
pub const APP_NAME: &str = "ragbridge";

/// Returns the environment variable prefix for this application.
pub fn env_prefix() -> String {
    "RAGBRIDGE".to_string()
}
