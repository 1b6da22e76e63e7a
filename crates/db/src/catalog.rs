use async_trait::async_trait;
use episodic_core::error::StoreError;
use episodic_core::store::CatalogWriter;
use episodic_core::types::UpdateCommand;
use sqlx::SqlitePool;
use tracing::debug;

use crate::DbError;
use crate::repo::items::{self, UpdateEffect};

/// SQLite-backed catalog store.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CatalogWriter for SqliteCatalog {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn apply_update(&self, command: &UpdateCommand) -> Result<(), StoreError> {
        match items::apply_update(&self.pool, command).await {
            Ok(effect) => {
                debug!(
                    item_id = %command.id,
                    series_key = %command.series_key,
                    changed = effect == UpdateEffect::Updated,
                    "applied series update"
                );
                Ok(())
            }
            Err(DbError::NotFound(id)) => Err(StoreError::NotFound(id)),
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use episodic_core::types::{MediaItem, MediaKind};

    #[tokio::test]
    async fn missing_item_surfaces_as_store_not_found() {
        let pool = crate::connect(":memory:").await.unwrap();
        crate::migrate::run(&pool).await.unwrap();
        let catalog = SqliteCatalog::new(pool);

        items::insert_item(
            catalog.pool(),
            &MediaItem {
                id: "a".into(),
                title: "Hostage 1".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let mut cmd = UpdateCommand {
            id: "a".into(),
            kind: MediaKind::Episodic,
            series_key: "hostage".into(),
            series_title: "Hostage".into(),
            season: 1,
            episode: 1,
        };
        assert_eq!(catalog.apply_update(&cmd).await, Ok(()));
        // Same command again is still a success.
        assert_eq!(catalog.apply_update(&cmd).await, Ok(()));

        cmd.id = "gone".into();
        assert_eq!(
            catalog.apply_update(&cmd).await,
            Err(StoreError::NotFound("gone".into()))
        );
    }
}
