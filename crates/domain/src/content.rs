//! # 公開コンテンツ
//!
//! サイトに掲載する公開コンテンツ（記事・講座・講師・バナー）を定義する。
//!
//! ## 設計方針
//!
//! 4 種類のコンテンツは管理操作（公開/アーカイブ/復元）がまったく同じため、
//! 種別を [`ContentKind`] で表現し、管理系の処理を一本化する。
//! 種別ごとの固有フィールドは公開 API の表示用フィールドに集約する。

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DomainError, status::EntityStatus};

/// コンテンツ ID（一意識別子）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct ContentId(Uuid);

impl ContentId {
    /// 新しいコンテンツ ID を生成する
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// 既存の UUID からコンテンツ ID を作成する
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 内部の UUID 参照を取得する
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ContentId {
    fn default() -> Self {
        Self::new()
    }
}

/// コンテンツ種別
///
/// URL パスセグメント（複数形）と同じ綴りで表現する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentKind {
    /// 記事
    Posts,
    /// 講座
    Courses,
    /// 講師
    Instructors,
    /// バナー
    Banners,
}

impl ContentKind {
    /// 対応するテーブル名を返す
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Courses => "courses",
            Self::Instructors => "instructors",
            Self::Banners => "banners",
        }
    }

    /// エラーメッセージ用のエンティティ種別名を返す
    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::Posts => "Post",
            Self::Courses => "Course",
            Self::Instructors => "Instructor",
            Self::Banners => "Banner",
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(Self::Posts),
            "courses" => Ok(Self::Courses),
            "instructors" => Ok(Self::Instructors),
            "banners" => Ok(Self::Banners),
            _ => Err(DomainError::Validation(format!(
                "不正なコンテンツ種別: {}",
                s
            ))),
        }
    }
}

/// コンテンツエンティティ（管理画面向けの共通ビュー）
///
/// # 不変条件
///
/// - `status` が `Archived` の場合、公開 API には露出しない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    id: ContentId,
    kind: ContentKind,
    title: String,
    description: Option<String>,
    image_url: Option<String>,
    status: EntityStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// 既存のデータからコンテンツを復元する（データベースから取得時）
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: ContentId,
        kind: ContentKind,
        title: String,
        description: Option<String>,
        image_url: Option<String>,
        status: EntityStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            title,
            description,
            image_url,
            status,
            created_at,
            updated_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &ContentId {
        &self.id
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn status(&self) -> EntityStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ビジネスロジックメソッド

    /// アーカイブ（論理削除）した新しいインスタンスを返す
    ///
    /// # エラー
    ///
    /// すでにアーカイブ済みの場合は `DomainError::Conflict` を返す。
    pub fn archived(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if self.status.is_archived() {
            return Err(DomainError::Conflict(format!(
                "{} はすでにアーカイブされています",
                self.kind.entity_type()
            )));
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
    /// アクティブなコンテンツを復元しようとした場合は `DomainError::Conflict` を返す。
    pub fn restored(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if self.status.is_active() {
            return Err(DomainError::Conflict(format!(
                "{} はアーカイブされていません",
                self.kind.entity_type()
            )));
        }

        Ok(Self {
            status: EntityStatus::Active,
            updated_at: now,
            ..self
        })
    }
}

/// コンテンツの公開ビュー
///
/// 公開 API の一覧エンドポイントが返す形式。アクティブなコンテンツのみが
/// この形式に変換される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub id:          ContentId,
    pub title:       String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url:   Option<String>,
    pub created_at:  DateTime<Utc>,
}

impl From<&ContentItem> for ContentSummary {
    fn from(item: &ContentItem) -> Self {
        Self {
            id:          item.id.clone(),
            title:       item.title.clone(),
            description: item.description.clone(),
            image_url:   item.image_url.clone(),
            created_at:  item.created_at,
        }
    }
}
