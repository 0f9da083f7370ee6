//! # ロールと権限
//!
//! ユーザーのロールと、ロールに紐づく権限を管理する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 用途 |
//! |---|------------|------|
//! | [`Role`] | ロール（役割） | RBAC。ユーザーに「管理者」「講師」等を割り当て |
//! | [`Permission`] | 権限 | ロールに紐づく操作許可（管理画面の各操作） |
//!
//! ## 設計方針
//!
//! 権限は閉じた列挙型で表現し、判定は集合の所属チェックで行う。
//! 文字列パターンマッチによる権限表現は、タイポが実行時まで
//! 検出されない・権限の全量が把握できないという問題があるため採用しない。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr};

use crate::DomainError;

/// ユーザーロール
///
/// ユーザーに割り当てられる役割。各ロールは固定の権限集合を持つ。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    EnumIter,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// システム管理者（全権限）
    Super,
    /// サイト管理者
    Admin,
    /// 一般ユーザー
    User,
    /// ゲスト
    Guest,
    /// 講師
    Teacher,
    /// 受講生
    Student,
    /// コンテンツ制作者
    Creator,
    /// 法人クライアント
    Client,
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super" => Ok(Self::Super),
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "guest" => Ok(Self::Guest),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            "creator" => Ok(Self::Creator),
            "client" => Ok(Self::Client),
            _ => Err(DomainError::Validation(format!("不正なロール: {}", s))),
        }
    }
}

/// 権限（閉じた列挙型）
///
/// 管理画面の操作単位で定義する。ロールまたは API キーの権限集合に
/// 含まれているかどうかで認可判定を行う。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    EnumIter,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    /// コンテンツ（記事・講座・講師・バナー）の管理
    ContentManage,
    /// ユーザーの管理
    UserManage,
    /// サイト設定の管理
    ConfigManage,
    /// アップロードファイルの管理
    StorageManage,
    /// レスポンスキャッシュの管理
    CacheManage,
}

impl std::str::FromStr for Permission {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content_manage" => Ok(Self::ContentManage),
            "user_manage" => Ok(Self::UserManage),
            "config_manage" => Ok(Self::ConfigManage),
            "storage_manage" => Ok(Self::StorageManage),
            "cache_manage" => Ok(Self::CacheManage),
            _ => Err(DomainError::Validation(format!("不正な権限: {}", s))),
        }
    }
}

impl Role {
    /// このロールに紐づく権限集合を返す
    ///
    /// ロールと権限の対応は固定（DB では管理しない）。
    ///
    /// | ロール | 権限 |
    /// |-------|------|
    /// | `Super` / `Admin` | 全権限 |
    /// | `Creator` / `Teacher` | コンテンツ管理のみ |
    /// | その他 | なし |
    pub fn permissions(&self) -> HashSet<Permission> {
        match self {
            Self::Super | Self::Admin => HashSet::from([
                Permission::ContentManage,
                Permission::UserManage,
                Permission::ConfigManage,
                Permission::StorageManage,
                Permission::CacheManage,
            ]),
            Self::Creator | Self::Teacher => HashSet::from([Permission::ContentManage]),
            Self::User | Self::Guest | Self::Student | Self::Client => HashSet::new(),
        }
    }

    /// このロールが指定の権限を持つか判定する
    pub fn has_permission(&self, required: Permission) -> bool {
        self.permissions().contains(&required)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    // ===== Role のテスト =====

    #[rstest]
    #[case("super", Role::Super)]
    #[case("admin", Role::Admin)]
    #[case("user", Role::User)]
    #[case("guest", Role::Guest)]
    #[case("teacher", Role::Teacher)]
    #[case("student", Role::Student)]
    #[case("creator", Role::Creator)]
    #[case("client", Role::Client)]
    fn test_ロールを文字列からパースできる(
        #[case] input: &str,
        #[case] expected: Role,
    ) {
        assert_eq!(input.parse::<Role>().unwrap(), expected);
    }

    #[rstest]
    fn test_不正なロール文字列はエラー() {
        assert!("owner".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[rstest]
    fn test_ロールの文字列表現はパースとラウンドトリップする() {
        for role in Role::iter() {
            let s = role.to_string();
            assert_eq!(s.parse::<Role>().unwrap(), role);
        }
    }

    // ===== 権限集合のテスト =====

    #[rstest]
    fn test_superは全権限を持つ() {
        let permissions = Role::Super.permissions();
        for permission in Permission::iter() {
            assert!(permissions.contains(&permission));
        }
    }

    #[rstest]
    fn test_adminは全権限を持つ() {
        let permissions = Role::Admin.permissions();
        for permission in Permission::iter() {
            assert!(permissions.contains(&permission));
        }
    }

    #[rstest]
    #[case(Role::Creator)]
    #[case(Role::Teacher)]
    fn test_制作系ロールはコンテンツ管理のみ持つ(#[case] role: Role) {
        let permissions = role.permissions();

        assert_eq!(permissions, HashSet::from([Permission::ContentManage]));
    }

    #[rstest]
    #[case(Role::User)]
    #[case(Role::Guest)]
    #[case(Role::Student)]
    #[case(Role::Client)]
    fn test_一般ロールは管理権限を持たない(#[case] role: Role) {
        assert!(role.permissions().is_empty());
    }

    #[rstest]
    fn test_has_permissionは集合の所属で判定する() {
        assert!(Role::Admin.has_permission(Permission::CacheManage));
        assert!(Role::Creator.has_permission(Permission::ContentManage));
        assert!(!Role::Creator.has_permission(Permission::UserManage));
        assert!(!Role::Student.has_permission(Permission::ContentManage));
    }

    // ===== Permission のテスト =====

    #[rstest]
    fn test_権限の文字列表現はパースとラウンドトリップする() {
        for permission in Permission::iter() {
            let s = permission.to_string();
            assert_eq!(s.parse::<Permission>().unwrap(), permission);
        }
    }

    #[rstest]
    fn test_不正な権限文字列はエラー() {
        assert!("content:*".parse::<Permission>().is_err());
        assert!("*".parse::<Permission>().is_err());
        assert!("".parse::<Permission>().is_err());
    }
}
