//! # エンティティステータス
//!
//! 公開コンテンツ・ユーザーに共通の公開状態を定義する。
//!
//! ## 設計方針
//!
//! 論理削除を「削除日時カラムが NULL かどうか」で表現すると、
//! 削除済みかの判定とその日時の取得が暗黙の規約になってしまう。
//! ここでは状態を明示的な 2 状態の列挙型として表現し、
//! アーカイブ日時はアーカイブ状態にのみ付随させる。

use chrono::{DateTime, Utc};

use crate::DomainError;

/// エンティティの公開状態
///
/// # 状態遷移
///
/// ```text
/// Active ──(archive)──→ Archived
/// Active ←──(restore)── Archived
/// ```
///
/// アーカイブは監査のための論理削除であり、物理削除は行わない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityStatus {
    /// 公開中
    Active,
    /// アーカイブ済み（論理削除）
    Archived {
        /// アーカイブされた日時
        archived_at: DateTime<Utc>,
    },
}

impl EntityStatus {
    /// データベースのカラムペア（状態文字列 + アーカイブ日時）から復元する
    ///
    /// # エラー
    ///
    /// 状態文字列が不正な場合、および `archived` なのにアーカイブ日時が
    /// 欠落している場合は `DomainError::Validation` を返す。
    pub fn from_db(status: &str, archived_at: Option<DateTime<Utc>>) -> Result<Self, DomainError> {
        match (status, archived_at) {
            ("active", _) => Ok(Self::Active),
            ("archived", Some(at)) => Ok(Self::Archived { archived_at: at }),
            ("archived", None) => Err(DomainError::Validation(
                "アーカイブ済みステータスにはアーカイブ日時が必要です".to_string(),
            )),
            (other, _) => Err(DomainError::Validation(format!(
                "不正なステータス: {}",
                other
            ))),
        }
    }

    /// データベースのカラムペアに変換する
    pub fn to_db(self) -> (&'static str, Option<DateTime<Utc>>) {
        match self {
            Self::Active => ("active", None),
            Self::Archived { archived_at } => ("archived", Some(archived_at)),
        }
    }

    /// 公開中か判定する
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// アーカイブ済みか判定する
    pub fn is_archived(&self) -> bool {
        matches!(self, Self::Archived { .. })
    }

    /// アーカイブ日時を取得する（公開中の場合は None）
    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Archived { archived_at } => Some(*archived_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[rstest]
    fn test_activeはアーカイブ日時を持たない() {
        let status = EntityStatus::Active;

        assert!(status.is_active());
        assert!(!status.is_archived());
        assert_eq!(status.archived_at(), None);
    }

    #[rstest]
    fn test_archivedはアーカイブ日時を持つ(now: DateTime<Utc>) {
        let status = EntityStatus::Archived { archived_at: now };

        assert!(!status.is_active());
        assert!(status.is_archived());
        assert_eq!(status.archived_at(), Some(now));
    }

    #[rstest]
    fn test_from_dbでactiveを復元できる() {
        let status = EntityStatus::from_db("active", None).unwrap();
        assert_eq!(status, EntityStatus::Active);
    }

    #[rstest]
    fn test_from_dbでarchivedを復元できる(now: DateTime<Utc>) {
        let status = EntityStatus::from_db("archived", Some(now)).unwrap();
        assert_eq!(status, EntityStatus::Archived { archived_at: now });
    }

    #[rstest]
    fn test_from_dbで日時欠落のarchivedはエラー() {
        assert!(EntityStatus::from_db("archived", None).is_err());
    }

    #[rstest]
    fn test_from_dbで不正なステータスはエラー() {
        assert!(EntityStatus::from_db("deleted", None).is_err());
    }

    #[rstest]
    fn test_to_dbとfrom_dbのラウンドトリップ(now: DateTime<Utc>) {
        let original = EntityStatus::Archived { archived_at: now };
        let (status, archived_at) = original.to_db();
        let restored = EntityStatus::from_db(status, archived_at).unwrap();

        assert_eq!(original, restored);
    }
}
