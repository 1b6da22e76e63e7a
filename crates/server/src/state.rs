use std::sync::Arc;

use episodic_db::SqliteCatalog;
use episodic_engine::reclassify::ApplyPacing;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub catalog: SqliteCatalog,
    pub apply_pacing: ApplyPacing,
    /// Held for the duration of an Apply run; only one runs at a time.
    pub apply_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(db: SqlitePool, apply_pacing: ApplyPacing) -> Self {
        Self {
            catalog: SqliteCatalog::new(db.clone()),
            db,
            apply_pacing,
            apply_lock: Arc::new(Mutex::new(())),
        }
    }
}
