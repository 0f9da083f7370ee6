//! # SiteConfigRepository
//!
//! サイト設定（キー/バリュー）の永続化を担当するリポジトリ。

use async_trait::async_trait;
use manabiya_domain::site_config::SiteConfigEntry;
use sqlx::{PgPool, Row as _};

use crate::error::InfraError;

/// サイト設定リポジトリトレイト
#[async_trait]
pub trait SiteConfigRepository: Send + Sync {
    /// 全設定エントリを取得する（キーの昇順）
    async fn find_all(&self) -> Result<Vec<SiteConfigEntry>, InfraError>;

    /// 設定エントリを保存する（存在すれば上書き）
    async fn upsert(&self, entry: &SiteConfigEntry) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の SiteConfigRepository
#[derive(Debug, Clone)]
pub struct PostgresSiteConfigRepository {
    pool: PgPool,
}

impl PostgresSiteConfigRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SiteConfigRepository for PostgresSiteConfigRepository {
    async fn find_all(&self) -> Result<Vec<SiteConfigEntry>, InfraError> {
        let rows = sqlx::query("SELECT key, value, updated_at FROM site_config ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(SiteConfigEntry {
                    key:        row.try_get("key")?,
                    value:      row.try_get("value")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    async fn upsert(&self, entry: &SiteConfigEntry) -> Result<(), InfraError> {
        sqlx::query(
            "INSERT INTO site_config (key, value, updated_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (key) \
             DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at",
        )
        .bind(&entry.key)
        .bind(&entry.value)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
