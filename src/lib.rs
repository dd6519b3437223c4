pub mod config;
pub mod http;
pub mod model;
pub mod progress;
pub mod session;
pub mod store;

pub use config::Config;
pub use http::{build_router, AppState};
