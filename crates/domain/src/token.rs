//! # リフレッシュトークン
//!
//! リフレッシュトークンエンティティを定義する。
//!
//! ## 設計方針
//!
//! - **追記専用**: トークンは失効フラグを立てるのみで物理削除しない。
//!   発行・失効の履歴が監査証跡として残る。
//! - **ローテーション**: トークン更新時は提示されたトークンを失効させ、
//!   新しいトークンを発行する。失効済みトークンでの更新は常に失敗する。

use chrono::{DateTime, Utc};

use crate::user::UserId;

/// リフレッシュトークンエンティティ
///
/// ログイン時に発行される不透明トークン。アクセストークンの
/// 再発行に使用する。
///
/// # 不変条件
///
/// - 一度失効したトークンは二度と認証に使えない
/// - 有効期限を過ぎたトークンは失効していなくても認証に使えない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    token: String,
    user_id: UserId,
    expires_at: DateTime<Utc>,
    revoked: bool,
    revoked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// 新しいリフレッシュトークンを作成する
    pub fn new(
        token: String,
        user_id: UserId,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            user_id,
            expires_at,
            revoked: false,
            revoked_at: None,
            created_at: now,
        }
    }

    /// 既存のデータからトークンを復元する（データベースから取得時）
    pub fn from_db(
        token: String,
        user_id: UserId,
        expires_at: DateTime<Utc>,
        revoked: bool,
        revoked_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            user_id,
            expires_at,
            revoked,
            revoked_at,
            created_at,
        }
    }

    // Getter メソッド

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    pub fn revoked_at(&self) -> Option<DateTime<Utc>> {
        self.revoked_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // ビジネスロジックメソッド

    /// このトークンで更新（ローテーション）できるか判定する
    ///
    /// 失効済み・期限切れのいずれかであれば false。
    pub fn can_refresh(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && now < self.expires_at
    }

    /// 失効させた新しいインスタンスを返す
    ///
    /// すでに失効済みの場合は元の失効日時を保持する（冪等）。
    pub fn revoked_now(self, now: DateTime<Utc>) -> Self {
        if self.revoked {
            return self;
        }

        Self {
            revoked: true,
            revoked_at: Some(now),
            ..self
        }
    }
}
