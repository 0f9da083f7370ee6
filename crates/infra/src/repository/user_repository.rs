//! # UserRepository
//!
//! ユーザー情報の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **パスワードハッシュの分離**: エンティティにはハッシュを含めず、
//!   認証時だけ `find_auth_by_email` でペアとして取得する
//! - **論理削除**: 物理削除はせず status と archived_at で表現する

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use manabiya_domain::{
    password::PasswordHash,
    role::Role,
    status::EntityStatus,
    user::{Email, ResetCode, User, UserId, UserName},
};
use sqlx::{PgPool, Row as _, postgres::PgRow};

use crate::error::InfraError;

/// ユーザーリポジトリトレイト
///
/// ユーザー情報の永続化操作を定義する。
/// インフラ層で具体的な実装を提供し、API 層から利用する。
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ID でユーザーを検索
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError>;

    /// メールアドレスでユーザーを検索
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError>;

    /// メールアドレスでユーザーとパスワードハッシュを取得
    ///
    /// ログイン時のみ使用する。ハッシュはエンティティに含めない。
    async fn find_auth_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, PasswordHash)>, InfraError>;

    /// 全ユーザー一覧を取得（アーカイブ済みを含む）
    ///
    /// 管理画面での表示用。作成日時の降順で返す。
    async fn find_all(&self) -> Result<Vec<User>, InfraError>;

    /// 最終ログイン日時を更新
    async fn update_last_login(&self, id: &UserId, now: DateTime<Utc>) -> Result<(), InfraError>;

    /// リセットコードを保存（クリア時は None）
    async fn save_reset_code(&self, user: &User) -> Result<(), InfraError>;

    /// パスワードを更新し、リセットコードを破棄する
    async fn update_password(
        &self,
        id: &UserId,
        hash: &PasswordHash,
        now: DateTime<Utc>,
    ) -> Result<(), InfraError>;

    /// ステータス（アーカイブ/復元）を保存
    async fn save_status(&self, user: &User) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, email, name, role, status, archived_at, \
     reset_code, reset_code_expires_at, last_login_at, created_at, updated_at";

fn user_from_row(row: &PgRow) -> Result<User, InfraError> {
    let status = EntityStatus::from_db(
        row.try_get::<&str, _>("status")?,
        row.try_get::<Option<DateTime<Utc>>, _>("archived_at")?,
    )
    .map_err(|e| InfraError::unexpected(e.to_string()))?;

    let reset_code = row
        .try_get::<Option<String>, _>("reset_code")?
        .map(ResetCode::new)
        .transpose()
        .map_err(|e| InfraError::unexpected(e.to_string()))?;

    Ok(User::from_db(
        UserId::from_uuid(row.try_get("id")?),
        Email::new(row.try_get::<String, _>("email")?)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        UserName::new(row.try_get::<String, _>("name")?)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        row.try_get::<String, _>("role")?
            .parse::<Role>()
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        status,
        reset_code,
        row.try_get("reset_code_expires_at")?,
        row.try_get("last_login_at")?,
        row.try_get("created_at")?,
        row.try_get("updated_at")?,
    ))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_auth_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, PasswordHash)>, InfraError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user = user_from_row(&row)?;
        let hash = PasswordHash::new(row.try_get::<String, _>("password_hash")?);

        Ok(Some((user, hash)))
    }

    async fn find_all(&self) -> Result<Vec<User>, InfraError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    async fn update_last_login(&self, id: &UserId, now: DateTime<Utc>) -> Result<(), InfraError> {
        sqlx::query("UPDATE users SET last_login_at = $2, updated_at = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn save_reset_code(&self, user: &User) -> Result<(), InfraError> {
        sqlx::query(
            "UPDATE users \
             SET reset_code = $2, reset_code_expires_at = $3, updated_at = $4 \
             WHERE id = $1",
        )
        .bind(user.id().as_uuid())
        .bind(user.reset_code().map(|c| c.as_str().to_string()))
        .bind(user.reset_code_expires_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_password(
        &self,
        id: &UserId,
        hash: &PasswordHash,
        now: DateTime<Utc>,
    ) -> Result<(), InfraError> {
        sqlx::query(
            "UPDATE users \
             SET password_hash = $2, reset_code = NULL, \
                 reset_code_expires_at = NULL, updated_at = $3 \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(hash.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_status(&self, user: &User) -> Result<(), InfraError> {
        let (status, archived_at) = user.status().to_db();

        sqlx::query(
            "UPDATE users \
             SET status = $2, archived_at = $3, updated_at = $4 \
             WHERE id = $1",
        )
        .bind(user.id().as_uuid())
        .bind(status)
        .bind(archived_at)
        .bind(user.updated_at())
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
        assert_send_sync::<PostgresUserRepository>();
    }
}
