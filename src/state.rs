use crate::{config::Config, store::PayrollStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PayrollStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn PayrollStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}
