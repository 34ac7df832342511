//! PostgreSQL content store backend.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{ItemStore, MetadataStore, TermStore};
use crate::models::{ItemContent, ItemId, ItemRecord, ItemStatus, MetaMap, NewItem};

const ITEM_COLUMNS: &str = "id, type, title, body, excerpt, author_id, status, comment_policy, \
     ping_policy, password, parent_id, sort_order, extra, slug, guid, created, changed";

/// Create a PostgreSQL connection pool.
pub async fn connect_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    Ok(pool)
}

/// PostgreSQL-backed content store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing tables when they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS item (
                id BIGSERIAL PRIMARY KEY,
                type TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL DEFAULT '',
                excerpt TEXT NOT NULL DEFAULT '',
                author_id BIGINT NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                comment_policy TEXT NOT NULL DEFAULT 'closed',
                ping_policy TEXT NOT NULL DEFAULT 'closed',
                password TEXT,
                parent_id BIGINT,
                sort_order INTEGER NOT NULL DEFAULT 0,
                extra JSONB NOT NULL DEFAULT '{}',
                slug TEXT NOT NULL DEFAULT '',
                guid TEXT NOT NULL DEFAULT '',
                created BIGINT NOT NULL,
                changed BIGINT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS item_meta (
                id BIGSERIAL PRIMARY KEY,
                item_id BIGINT NOT NULL REFERENCES item(id) ON DELETE CASCADE,
                meta_key TEXT NOT NULL,
                meta_value TEXT NOT NULL
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS item_meta_key_idx
                ON item_meta (item_id, meta_key)
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS item_term (
                item_id BIGINT NOT NULL REFERENCES item(id) ON DELETE CASCADE,
                taxonomy TEXT NOT NULL,
                slug TEXT NOT NULL,
                PRIMARY KEY (item_id, taxonomy, slug)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS taxonomy_binding (
                item_type TEXT NOT NULL,
                taxonomy TEXT NOT NULL,
                PRIMARY KEY (item_type, taxonomy)
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("failed to create shadowdraft schema")?;
        }

        Ok(())
    }
}

#[async_trait]
impl ItemStore for PgStore {
    async fn load(&self, id: ItemId) -> Result<Option<ItemRecord>> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM item WHERE id = $1");
        let item = sqlx::query_as::<_, ItemRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch item by id")?;

        Ok(item)
    }

    async fn insert(&self, item: NewItem) -> Result<ItemId> {
        let now = chrono::Utc::now().timestamp();
        let content = item.content;

        let mut tx = self.pool.begin().await.context("failed to start transaction")?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO item (type, title, body, excerpt, author_id, status, comment_policy,
                              ping_policy, password, parent_id, sort_order, extra, created, changed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            RETURNING id
            "#,
        )
        .bind(&content.item_type)
        .bind(&content.title)
        .bind(&content.body)
        .bind(&content.excerpt)
        .bind(content.author_id)
        .bind(item.status.as_str())
        .bind(content.comment_policy.as_str())
        .bind(content.ping_policy.as_str())
        .bind(&content.password)
        .bind(content.parent_id)
        .bind(content.sort_order)
        .bind(&content.extra)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .context("failed to insert item")?;

        // Slug and guid depend on the assigned id, so backfill them within
        // the same transaction.
        sqlx::query(
            r#"
            UPDATE item
            SET slug = trim(both '-' from regexp_replace(lower(title), '[^a-z0-9]+', '-', 'g'))
                       || '-' || id,
                guid = 'urn:content-item:' || id
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("failed to assign item slug")?;

        tx.commit().await.context("failed to commit transaction")?;

        Ok(ItemId(id))
    }

    async fn update(&self, id: ItemId, content: &ItemContent) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            UPDATE item SET
                type = $1,
                title = $2,
                body = $3,
                excerpt = $4,
                author_id = $5,
                comment_policy = $6,
                ping_policy = $7,
                password = $8,
                parent_id = $9,
                sort_order = $10,
                extra = $11,
                changed = $12
            WHERE id = $13
            "#,
        )
        .bind(&content.item_type)
        .bind(&content.title)
        .bind(&content.body)
        .bind(&content.excerpt)
        .bind(content.author_id)
        .bind(content.comment_policy.as_str())
        .bind(content.ping_policy.as_str())
        .bind(&content.password)
        .bind(content.parent_id)
        .bind(content.sort_order)
        .bind(&content.extra)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("failed to update item")?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_status(&self, id: ItemId, status: ItemStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE item SET status = $1, changed = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(chrono::Utc::now().timestamp())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to update item status")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: ItemId) -> Result<bool> {
        // Metadata and term rows are removed via CASCADE.
        let result = sqlx::query("DELETE FROM item WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete item")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MetadataStore for PgStore {
    async fn all_meta(&self, id: ItemId) -> Result<MetaMap> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT meta_key, meta_value FROM item_meta WHERE item_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch item metadata")?;

        let mut meta = MetaMap::new();
        for (key, value) in rows {
            meta.entry(key).or_default().push(value);
        }

        Ok(meta)
    }

    async fn first_meta(&self, id: ItemId, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT meta_value FROM item_meta WHERE item_id = $1 AND meta_key = $2 \
             ORDER BY id LIMIT 1",
        )
        .bind(id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch item metadata value")?;

        Ok(value)
    }

    async fn add_meta(&self, id: ItemId, key: &str, value: &str) -> Result<()> {
        // Unknown items must be a silent no-op, not a foreign key violation.
        sqlx::query(
            r#"
            INSERT INTO item_meta (item_id, meta_key, meta_value)
            SELECT $1, $2, $3 WHERE EXISTS (SELECT 1 FROM item WHERE id = $1)
            "#,
        )
        .bind(id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .context("failed to add item metadata")?;

        Ok(())
    }

    async fn unset_meta(&self, id: ItemId, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM item_meta WHERE item_id = $1 AND meta_key = $2")
            .bind(id)
            .bind(key)
            .execute(&self.pool)
            .await
            .context("failed to remove item metadata")?;

        Ok(())
    }
}

#[async_trait]
impl TermStore for PgStore {
    async fn assigned_terms(&self, id: ItemId, taxonomy: &str) -> Result<BTreeSet<String>> {
        let slugs = sqlx::query_scalar::<_, String>(
            "SELECT slug FROM item_term WHERE item_id = $1 AND taxonomy = $2",
        )
        .bind(id)
        .bind(taxonomy)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch term assignments")?;

        Ok(slugs.into_iter().collect())
    }

    async fn set_assigned_terms(
        &self,
        id: ItemId,
        taxonomy: &str,
        slugs: &BTreeSet<String>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.context("failed to start transaction")?;

        sqlx::query("DELETE FROM item_term WHERE item_id = $1 AND taxonomy = $2")
            .bind(id)
            .bind(taxonomy)
            .execute(&mut *tx)
            .await
            .context("failed to clear term assignments")?;

        for slug in slugs {
            sqlx::query(
                r#"
                INSERT INTO item_term (item_id, taxonomy, slug)
                SELECT $1, $2, $3 WHERE EXISTS (SELECT 1 FROM item WHERE id = $1)
                "#,
            )
            .bind(id)
            .bind(taxonomy)
            .bind(slug)
            .execute(&mut *tx)
            .await
            .context("failed to assign term")?;
        }

        tx.commit().await.context("failed to commit transaction")?;

        Ok(())
    }

    async fn applicable_taxonomies(&self, item_type: &str) -> Result<Vec<String>> {
        let taxonomies = sqlx::query_scalar::<_, String>(
            "SELECT taxonomy FROM taxonomy_binding WHERE item_type = $1 ORDER BY taxonomy",
        )
        .bind(item_type)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch taxonomy bindings")?;

        Ok(taxonomies)
    }
}
