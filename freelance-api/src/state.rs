use crate::config::Config;
use freelance_core::Market;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub market: Market,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(market: Market, config: Config) -> Self {
        Self {
            market,
            config: Arc::new(config),
        }
    }
}
