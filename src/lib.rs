pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

use services::FileProcessor;

// Application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: config::Config,
    pub processor: FileProcessor,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        let processor = FileProcessor::new(config.analysis_policy(), config.cleaning_policy());
        Self { config, processor }
    }
}
