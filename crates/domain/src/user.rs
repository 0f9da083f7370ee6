//! # ユーザー
//!
//! ユーザーエンティティとそれに関連する値オブジェクトを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 用途 |
//! |---|------------|------|
//! | [`User`] | ユーザー | 会員・管理者を問わずログイン主体を表す |
//! | [`Email`] | メールアドレス | ログイン ID を兼ねる |
//! | [`ResetCode`] | リセットコード | パスワード再設定用のワンタイムコード |
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: UserId は UUID をラップし、型安全性を確保
//! - **不変性**: エンティティフィールドは基本的に不変、変更はメソッド経由
//! - **バリデーション**: 値オブジェクトの生成時に検証ロジックを実行

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DomainError, role::Role, status::EntityStatus};

/// ユーザー ID（一意識別子）
///
/// UUID v7 を使用し、生成順にソート可能。
/// Newtype パターンで型安全性を確保。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct UserId(Uuid);

impl UserId {
    /// 新しいユーザー ID を生成する
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// 既存の UUID からユーザー ID を作成する
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 内部の UUID 参照を取得する
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// メールアドレス（値オブジェクト）
///
/// 生成時にバリデーションを実行し、不正な値の作成を防ぐ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `local@domain` の形式である
    /// - 最大 255 文字
    ///
    /// # エラー
    ///
    /// バリデーションに失敗した場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザー名（値オブジェクト）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct UserName(String);

impl UserName {
    /// ユーザー名を作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - 最大 100 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::Validation("名前は必須です".to_string()));
        }

        if value.chars().count() > 100 {
            return Err(DomainError::Validation(
                "名前は100文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// パスワード再設定用のワンタイムコード（値オブジェクト）
///
/// メールで送付される 6 桁の数字コード。有効期限とセットで永続化される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetCode(String);

impl ResetCode {
    /// リセットコードを作成する
    ///
    /// # バリデーション
    ///
    /// - ASCII 数字 6 桁
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::Validation(
                "リセットコードは6桁の数字である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// ユーザーエンティティ
///
/// サイトのログイン主体を表現する。メール/パスワード認証でログインする。
/// パスワードハッシュはエンティティに含めず、リポジトリ経由でのみ扱う。
///
/// # 不変条件
///
/// - `email` はシステム内で一意
/// - `status` が `Archived` の場合、ログイン不可
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: Email,
    name: UserName,
    role: Role,
    status: EntityStatus,
    reset_code: Option<ResetCode>,
    reset_code_expires_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// 新しいユーザーを作成する
    ///
    /// # 不変条件
    ///
    /// - 作成時のステータスは `Active`
    /// - `last_login_at`・リセットコードは未設定
    pub fn new(id: UserId, email: Email, name: UserName, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            id,
            email,
            name,
            role,
            status: EntityStatus::Active,
            reset_code: None,
            reset_code_expires_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 既存のデータからユーザーを復元する（データベースから取得時）
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: UserId,
        email: Email,
        name: UserName,
        role: Role,
        status: EntityStatus,
        reset_code: Option<ResetCode>,
        reset_code_expires_at: Option<DateTime<Utc>>,
        last_login_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            name,
            role,
            status,
            reset_code,
            reset_code_expires_at,
            last_login_at,
            created_at,
            updated_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn status(&self) -> EntityStatus {
        self.status
    }

    pub fn reset_code(&self) -> Option<&ResetCode> {
        self.reset_code.as_ref()
    }

    pub fn reset_code_expires_at(&self) -> Option<DateTime<Utc>> {
        self.reset_code_expires_at
    }

    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ビジネスロジックメソッド

    /// ユーザーがログイン可能か判定する
    ///
    /// アクティブステータスの場合に true を返す。
    pub fn can_login(&self) -> bool {
        self.status.is_active()
    }

    /// リセットコードが指定時点で有効か判定する
    ///
    /// コード未設定・期限未設定・期限切れのいずれでも false。
    pub fn reset_code_valid_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.reset_code, self.reset_code_expires_at) {
            (Some(_), Some(expires_at)) => now < expires_at,
            _ => false,
        }
    }

    /// 最終ログイン日時を更新した新しいインスタンスを返す
    pub fn with_last_login_updated(self, now: DateTime<Utc>) -> Self {
        Self {
            last_login_at: Some(now),
            updated_at: now,
            ..self
        }
    }

    /// リセットコードを設定した新しいインスタンスを返す
    pub fn with_reset_code(
        self,
        code: ResetCode,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            reset_code: Some(code),
            reset_code_expires_at: Some(expires_at),
            updated_at: now,
            ..self
        }
    }

    /// リセットコードを破棄した新しいインスタンスを返す
    pub fn with_reset_code_cleared(self, now: DateTime<Utc>) -> Self {
        Self {
            reset_code: None,
            reset_code_expires_at: None,
            updated_at: now,
            ..self
        }
    }

    /// アーカイブ（論理削除）した新しいインスタンスを返す
    ///
    /// # エラー
    ///
    /// すでにアーカイブ済みの場合は `DomainError::Conflict` を返す。
    pub fn archived(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if self.status.is_archived() {
            return Err(DomainError::Conflict(
                "ユーザーはすでにアーカイブされています".to_string(),
            ));
        }

        Ok(Self {
            status: EntityStatus::Archived { archived_at: now },
            updated_at: now,
            ..self
        })
    }

    /// アーカイブから復元した新しいインスタンスを返す
    ///
    /// # エラー
    ///
    /// アクティブなユーザーを復元しようとした場合は `DomainError::Conflict` を返す。
    pub fn restored(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if self.status.is_active() {
            return Err(DomainError::Conflict(
                "ユーザーはアーカイブされていません".to_string(),
            ));
        }

        Ok(Self {
            status: EntityStatus::Active,
            updated_at: now,
            ..self
        })
    }
}
