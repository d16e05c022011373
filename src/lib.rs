pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod store;

// Layered boundaries: capability ports and their adapters
pub mod app;
pub mod infra;
