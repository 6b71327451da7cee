pub mod config;
pub mod error;
pub mod extract;
pub mod headers;
pub mod logging;
pub mod metrics;
pub mod resources;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use server::{build_state, create_server, start_server};
pub use state::AppState;
