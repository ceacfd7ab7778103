pub mod config;
mod convert_routes;
mod download;
mod error;
mod health;
mod http_layers;
#[allow(clippy::module_inception)]
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use http_layers::*;
pub use server::{make_app, make_metrics_app, run_server};
