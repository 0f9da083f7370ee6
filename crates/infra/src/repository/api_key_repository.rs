//! # ApiKeyRepository
//!
//! API キーの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **平文キーは保存しない**: SHA-256 ハッシュのみを永続化し、
//!   認証時は提示されたキーのハッシュで突き合わせる
//! - **権限は JSONB 配列**: 閉じた権限集合の文字列表現を保存する

use std::collections::HashSet;

use async_trait::async_trait;
use manabiya_domain::{
    api_key::{ApiKey, ApiKeyId},
    role::Permission,
};
use sha2::{Digest as _, Sha256};
use sqlx::{PgPool, Row as _};

use crate::error::InfraError;

/// 平文の API キーを SHA-256 でハッシュ化する（hex 表現）
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// API キーリポジトリトレイト
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// キーハッシュで API キーを検索する
    async fn find_by_key_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, InfraError>;
}

/// PostgreSQL 実装の ApiKeyRepository
#[derive(Debug, Clone)]
pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn find_by_key_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, InfraError> {
        let row = sqlx::query(
            "SELECT id, label, key_hash, permissions, revoked, created_at \
             FROM api_keys \
             WHERE key_hash = $1",
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let permissions: HashSet<Permission> = row
            .try_get::<serde_json::Value, _>("permissions")?
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| {
                        s.parse::<Permission>()
                            .map_err(|e| InfraError::unexpected(e.to_string()))
                    })
                    .collect::<Result<HashSet<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Some(ApiKey::from_db(
            ApiKeyId::from_uuid(row.try_get("id")?),
            row.try_get("label")?,
            row.try_get("key_hash")?,
            permissions,
            row.try_get("revoked")?,
            row.try_get("created_at")?,
        )))
    }
}
