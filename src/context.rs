use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::CompletionService;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub completion: Arc<dyn CompletionService>,
}

impl AppContext {
    pub fn new(config: AppConfig, completion: Arc<dyn CompletionService>) -> Self {
        Self { config, completion }
    }
}
