//! # ContentRepository
//!
//! 公開コンテンツ（記事・講座・講師・バナー）の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **種別ごとに同型のテーブル**: 4 テーブルは同じ列構成を持ち、
//!   [`ContentKind::table_name`] で切り替える。テーブル名は閉じた
//!   列挙型から得るため SQL 文字列への埋め込みは安全。
//! - **論理削除**: 物理削除はせず status と archived_at で表現する

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use manabiya_domain::{
    content::{ContentId, ContentItem, ContentKind},
    status::EntityStatus,
};
use sqlx::{PgPool, Row as _, postgres::PgRow};

use crate::error::InfraError;

/// コンテンツリポジトリトレイト
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// ID でコンテンツを検索する
    async fn find_by_id(
        &self,
        kind: ContentKind,
        id: &ContentId,
    ) -> Result<Option<ContentItem>, InfraError>;

    /// アクティブなコンテンツの一覧を取得する
    ///
    /// 公開 API 用。作成日時の降順で返す。
    async fn find_all_active(&self, kind: ContentKind) -> Result<Vec<ContentItem>, InfraError>;

    /// 全コンテンツの一覧を取得する（アーカイブ済みを含む）
    ///
    /// 管理画面での表示用。作成日時の降順で返す。
    async fn find_all(&self, kind: ContentKind) -> Result<Vec<ContentItem>, InfraError>;

    /// ステータス（アーカイブ/復元）を保存する
    async fn save_status(&self, item: &ContentItem) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の ContentRepository
#[derive(Debug, Clone)]
pub struct PostgresContentRepository {
    pool: PgPool,
}

impl PostgresContentRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CONTENT_COLUMNS: &str =
    "id, title, description, image_url, status, archived_at, created_at, updated_at";

fn content_from_row(kind: ContentKind, row: &PgRow) -> Result<ContentItem, InfraError> {
    let status = EntityStatus::from_db(
        row.try_get::<&str, _>("status")?,
        row.try_get::<Option<DateTime<Utc>>, _>("archived_at")?,
    )
    .map_err(|e| InfraError::unexpected(e.to_string()))?;

    Ok(ContentItem::from_db(
        ContentId::from_uuid(row.try_get("id")?),
        kind,
        row.try_get("title")?,
        row.try_get("description")?,
        row.try_get("image_url")?,
        status,
        row.try_get("created_at")?,
        row.try_get("updated_at")?,
    ))
}

#[async_trait]
impl ContentRepository for PostgresContentRepository {
    async fn find_by_id(
        &self,
        kind: ContentKind,
        id: &ContentId,
    ) -> Result<Option<ContentItem>, InfraError> {
        let row = sqlx::query(&format!(
            "SELECT {CONTENT_COLUMNS} FROM {} WHERE id = $1",
            kind.table_name()
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(|row| content_from_row(kind, row)).transpose()
    }

    async fn find_all_active(&self, kind: ContentKind) -> Result<Vec<ContentItem>, InfraError> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTENT_COLUMNS} FROM {} \
             WHERE status = 'active' \
             ORDER BY created_at DESC",
            kind.table_name()
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| content_from_row(kind, row)).collect()
    }

    async fn find_all(&self, kind: ContentKind) -> Result<Vec<ContentItem>, InfraError> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTENT_COLUMNS} FROM {} ORDER BY created_at DESC",
            kind.table_name()
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| content_from_row(kind, row)).collect()
    }

    async fn save_status(&self, item: &ContentItem) -> Result<(), InfraError> {
        let (status, archived_at) = item.status().to_db();

        sqlx::query(&format!(
            "UPDATE {} \
             SET status = $2, archived_at = $3, updated_at = $4 \
             WHERE id = $1",
            item.kind().table_name()
        ))
        .bind(item.id().as_uuid())
        .bind(status)
        .bind(archived_at)
        .bind(item.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresContentRepository>();
    }
}
