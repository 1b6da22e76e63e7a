use episodic_core::types::{MediaItem, MediaKind, UpdateCommand};
use sqlx::SqlitePool;

use crate::DbError;

type ItemTuple = (
    String,
    String,
    String,
    String,
    String,
    String,
    Option<i64>,
    String,
    Option<String>,
    Option<String>,
    Option<i64>,
    Option<i64>,
);

const ITEM_COLUMNS: &str = "id, title, description, media_url, thumbnail_url, genre, \
     release_year, kind, series_key, series_title, season_number, episode_number";

/// Result of applying one update command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEffect {
    Updated,
    /// The row already matched the command; nothing was written.
    Unchanged,
}

/// Append an item at the end of the catalog. A blank id gets a fresh UUID.
pub async fn insert_item(pool: &SqlitePool, item: &MediaItem) -> Result<MediaItem, sqlx::Error> {
    let mut stored = item.clone();
    if stored.id.trim().is_empty() {
        stored.id = uuid::Uuid::new_v4().to_string();
    }
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO media_item (id, position, title, description, media_url, thumbnail_url, \
         genre, release_year, kind, series_key, series_title, season_number, episode_number, \
         created_ts, updated_ts) \
         VALUES (?, (SELECT COALESCE(MAX(position), -1) + 1 FROM media_item), \
         ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&stored.id)
    .bind(&stored.title)
    .bind(&stored.description)
    .bind(&stored.media_url)
    .bind(&stored.thumbnail_url)
    .bind(&stored.genre)
    .bind(stored.release_year.map(i64::from))
    .bind(stored.kind.as_str())
    .bind(&stored.explicit_series_key)
    .bind(&stored.series_title)
    .bind(stored.explicit_season.map(i64::from))
    .bind(stored.explicit_episode.map(i64::from))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(stored)
}

/// The full catalog in stable catalog order.
pub async fn list_catalog(pool: &SqlitePool) -> Result<Vec<MediaItem>, sqlx::Error> {
    let query = format!("SELECT {ITEM_COLUMNS} FROM media_item ORDER BY position, id");
    let rows: Vec<ItemTuple> = sqlx::query_as(&query).fetch_all(pool).await?;
    Ok(rows.into_iter().map(row_to_item).collect())
}

pub async fn get_item(pool: &SqlitePool, item_id: &str) -> Result<Option<MediaItem>, sqlx::Error> {
    let query = format!("SELECT {ITEM_COLUMNS} FROM media_item WHERE id = ?");
    let row: Option<ItemTuple> = sqlx::query_as(&query)
        .bind(item_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(row_to_item))
}

/// Write the episodic fields from `cmd`. Rows that already match are left
/// untouched, including `updated_ts`.
pub async fn apply_update(pool: &SqlitePool, cmd: &UpdateCommand) -> Result<UpdateEffect, DbError> {
    let season = i64::from(cmd.season);
    let episode = i64::from(cmd.episode);
    let now = chrono::Utc::now().timestamp();

    let result = sqlx::query(
        "UPDATE media_item SET kind = ?, series_key = ?, series_title = ?, \
         season_number = ?, episode_number = ?, updated_ts = ? \
         WHERE id = ? AND (kind IS NOT ? OR series_key IS NOT ? OR series_title IS NOT ? \
         OR season_number IS NOT ? OR episode_number IS NOT ?)",
    )
    .bind(cmd.kind.as_str())
    .bind(&cmd.series_key)
    .bind(&cmd.series_title)
    .bind(season)
    .bind(episode)
    .bind(now)
    .bind(&cmd.id)
    .bind(cmd.kind.as_str())
    .bind(&cmd.series_key)
    .bind(&cmd.series_title)
    .bind(season)
    .bind(episode)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(UpdateEffect::Updated);
    }

    let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM media_item WHERE id = ?")
        .bind(&cmd.id)
        .fetch_optional(pool)
        .await?;
    match exists {
        Some(_) => Ok(UpdateEffect::Unchanged),
        None => Err(DbError::NotFound(cmd.id.clone())),
    }
}

fn row_to_item(r: ItemTuple) -> MediaItem {
    MediaItem {
        id: r.0,
        title: r.1,
        description: r.2,
        media_url: r.3,
        thumbnail_url: r.4,
        genre: r.5,
        release_year: r.6.and_then(|y| i32::try_from(y).ok()),
        kind: MediaKind::parse(&r.7).unwrap_or_default(),
        explicit_series_key: r.8,
        series_title: r.9,
        explicit_season: r.10.and_then(|v| u32::try_from(v).ok()),
        explicit_episode: r.11.and_then(|v| u32::try_from(v).ok()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = crate::connect(":memory:").await.unwrap();
        crate::migrate::run(&pool).await.unwrap();
        pool
    }

    async fn get_updated_ts(pool: &SqlitePool, item_id: &str) -> Option<i64> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT updated_ts FROM media_item WHERE id = ?")
            .bind(item_id)
            .fetch_optional(pool)
            .await
            .unwrap();
        row.map(|(ts,)| ts)
    }

    fn item(id: &str, title: &str) -> MediaItem {
        MediaItem {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    fn command(id: &str, episode: u32) -> UpdateCommand {
        UpdateCommand {
            id: id.into(),
            kind: MediaKind::Episodic,
            series_key: "hostage".into(),
            series_title: "Hostage".into(),
            season: 1,
            episode,
        }
    }

    #[tokio::test]
    async fn catalog_keeps_insertion_order() {
        let pool = test_pool().await;
        for (id, title) in [("z", "Zodiac"), ("a", "Avatar"), ("m", "Heat")] {
            insert_item(&pool, &item(id, title)).await.unwrap();
        }
        let ids: Vec<_> = list_catalog(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[tokio::test]
    async fn blank_id_gets_generated() {
        let pool = test_pool().await;
        let stored = insert_item(&pool, &item("", "Avatar")).await.unwrap();
        assert!(!stored.id.is_empty());
        let fetched = get_item(&pool, &stored.id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn fields_round_trip() {
        let pool = test_pool().await;
        let original = MediaItem {
            id: "x".into(),
            title: "Breaking Bad S01E01".into(),
            description: "Pilot".into(),
            media_url: "https://cdn.example/x.mp4".into(),
            thumbnail_url: "https://cdn.example/x.jpg".into(),
            genre: "Drama".into(),
            release_year: Some(2008),
            kind: MediaKind::Episodic,
            explicit_series_key: Some("breaking bad".into()),
            series_title: Some("Breaking Bad".into()),
            explicit_season: Some(1),
            explicit_episode: Some(1),
        };
        insert_item(&pool, &original).await.unwrap();
        assert_eq!(get_item(&pool, "x").await.unwrap(), Some(original));
    }

    #[tokio::test]
    async fn update_writes_episodic_fields() {
        let pool = test_pool().await;
        insert_item(&pool, &item("h2", "Hostage 2")).await.unwrap();

        let effect = apply_update(&pool, &command("h2", 2)).await.unwrap();
        assert_eq!(effect, UpdateEffect::Updated);

        let stored = get_item(&pool, "h2").await.unwrap().unwrap();
        assert!(command("h2", 2).is_satisfied_by(&stored));
        assert_eq!(stored.title, "Hostage 2");
    }

    #[tokio::test]
    async fn reapplying_the_same_update_is_a_no_op() {
        let pool = test_pool().await;
        insert_item(&pool, &item("h1", "Hostage 1")).await.unwrap();
        apply_update(&pool, &command("h1", 1)).await.unwrap();

        sqlx::query("UPDATE media_item SET updated_ts = 42 WHERE id = 'h1'")
            .execute(&pool)
            .await
            .unwrap();

        let effect = apply_update(&pool, &command("h1", 1)).await.unwrap();
        assert_eq!(effect, UpdateEffect::Unchanged);
        assert_eq!(get_updated_ts(&pool, "h1").await, Some(42));
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let pool = test_pool().await;
        let err = apply_update(&pool, &command("missing", 1)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(id) if id == "missing"));
    }
}
