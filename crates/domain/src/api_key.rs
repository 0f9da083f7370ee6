//! # API キー
//!
//! 管理 API をサーバー間連携から呼び出すための API キーを定義する。
//!
//! ## 設計方針
//!
//! - キーの平文は保存しない。SHA-256 ハッシュのみを永続化し、
//!   認証時は提示されたキーのハッシュで突き合わせる。
//! - 権限は閉じた [`Permission`] の集合で表現する。

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Permission;

/// API キー ID（一意識別子）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct ApiKeyId(Uuid);

impl ApiKeyId {
    /// 新しい API キー ID を生成する
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// 既存の UUID から API キー ID を作成する
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 内部の UUID 参照を取得する
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ApiKeyId {
    fn default() -> Self {
        Self::new()
    }
}

/// API キーエンティティ
///
/// # 不変条件
///
/// - 失効済みのキーはいかなる権限判定も通らない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    id: ApiKeyId,
    label: String,
    key_hash: String,
    permissions: HashSet<Permission>,
    revoked: bool,
    created_at: DateTime<Utc>,
}

impl ApiKey {
    /// 新しい API キーを作成する
    ///
    /// `key_hash` は平文キーの SHA-256 ハッシュ（hex 表現）。
    pub fn new(
        id: ApiKeyId,
        label: String,
        key_hash: String,
        permissions: HashSet<Permission>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            label,
            key_hash,
            permissions,
            revoked: false,
            created_at: now,
        }
    }

    /// 既存のデータから API キーを復元する（データベースから取得時）
    pub fn from_db(
        id: ApiKeyId,
        label: String,
        key_hash: String,
        permissions: HashSet<Permission>,
        revoked: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            label,
            key_hash,
            permissions,
            revoked,
            created_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &ApiKeyId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn key_hash(&self) -> &str {
        &self.key_hash
    }

    pub fn permissions(&self) -> &HashSet<Permission> {
        &self.permissions
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // ビジネスロジックメソッド

    /// このキーで指定の権限の操作が許可されるか判定する
    ///
    /// 失効済みのキーは常に false。
    pub fn allows(&self, required: Permission) -> bool {
        !self.revoked && self.permissions.contains(&required)
    }
}
