//! # RefreshTokenRepository
//!
//! リフレッシュトークンの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **追記専用**: 失効はフラグ更新のみで物理削除しない。
//!   発行・失効の履歴が監査証跡として残る。
//! - **失効の一方向性**: UPDATE は常に `revoked = FALSE` の行だけを
//!   対象にし、最初の失効日時を上書きしない。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use manabiya_domain::{token::RefreshToken, user::UserId};
use sqlx::{PgPool, Row as _, postgres::PgRow};

use crate::error::InfraError;

/// リフレッシュトークンリポジトリトレイト
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// トークンを新規保存する
    async fn create(&self, token: &RefreshToken) -> Result<(), InfraError>;

    /// トークン値でトークンを検索する
    async fn find(&self, token: &str) -> Result<Option<RefreshToken>, InfraError>;

    /// トークンを失効させ、失効させた件数（0 または 1）を返す
    ///
    /// 既に失効済みのトークンに対しては 0 を返す。ローテーションでは
    /// この戻り値で並行する更新要求のどちらが失効を取れたかを判定する。
    async fn revoke(&self, token: &str, now: DateTime<Utc>) -> Result<u64, InfraError>;

    /// ユーザーの未失効トークンをすべて失効させ、失効させた件数を返す
    ///
    /// パスワード変更時・ユーザーのアーカイブ時に使用する。
    async fn revoke_all_for_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, InfraError>;

    /// ユーザーの最新の未失効トークンを失効させる
    ///
    /// Cookie を提示しないログアウト要求のフォールバックとして使用する。
    async fn revoke_latest_for_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の RefreshTokenRepository
#[derive(Debug, Clone)]
pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn token_from_row(row: &PgRow) -> Result<RefreshToken, InfraError> {
    Ok(RefreshToken::from_db(
        row.try_get("token")?,
        UserId::from_uuid(row.try_get("user_id")?),
        row.try_get("expires_at")?,
        row.try_get("revoked")?,
        row.try_get("revoked_at")?,
        row.try_get("created_at")?,
    ))
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn create(&self, token: &RefreshToken) -> Result<(), InfraError> {
        sqlx::query(
            "INSERT INTO refresh_tokens \
                 (token, user_id, expires_at, revoked, revoked_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(token.token())
        .bind(token.user_id().as_uuid())
        .bind(token.expires_at())
        .bind(token.is_revoked())
        .bind(token.revoked_at())
        .bind(token.created_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshToken>, InfraError> {
        let row = sqlx::query(
            "SELECT token, user_id, expires_at, revoked, revoked_at, created_at \
             FROM refresh_tokens \
             WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(token_from_row).transpose()
    }

    async fn revoke(&self, token: &str, now: DateTime<Utc>) -> Result<u64, InfraError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens \
             SET revoked = TRUE, revoked_at = $2 \
             WHERE token = $1 AND revoked = FALSE",
        )
        .bind(token)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn revoke_all_for_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, InfraError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens \
             SET revoked = TRUE, revoked_at = $2 \
             WHERE user_id = $1 AND revoked = FALSE",
        )
        .bind(user_id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn revoke_latest_for_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), InfraError> {
        sqlx::query(
            "UPDATE refresh_tokens \
             SET revoked = TRUE, revoked_at = $2 \
             WHERE token = ( \
                 SELECT token FROM refresh_tokens \
                 WHERE user_id = $1 AND revoked = FALSE \
                 ORDER BY created_at DESC \
                 LIMIT 1 \
             )",
        )
        .bind(user_id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
