use crate::config::Config;
use crate::models::AppData;
use crate::store::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
}

impl AppState {
    pub fn new(config: Config, data: AppData) -> Self {
        let db = Database::new(config.data_path.clone(), data);
        Self {
            config: Arc::new(config),
            db,
        }
    }
}
