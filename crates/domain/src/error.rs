//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//! | `NotFound` | 404 Not Found | エンティティが存在しない |
//! | `Conflict` | 409 Conflict | 状態遷移の競合（復元済みの再復元など） |
//! | `Forbidden` | 403 Forbidden | 権限不足 |

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// ビジネスロジックの実行中に発生する例外状態を表現する。
/// API 層でこのエラーを受け取り、適切な HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// エンティティが見つからない
    ///
    /// 指定された ID のエンティティがデータベースに存在しない場合に使用する。
    /// `entity_type` にはエンティティの種類（"User", "Post" など）を指定し、
    /// エラーメッセージを具体的にする。
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"User", "Post", "Course" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 競合エラー
    ///
    /// すでにアーカイブ済みのエンティティの再アーカイブや、
    /// アクティブなエンティティの復元など、現在の状態と矛盾する
    /// 操作が要求された場合に使用する。
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// 権限エラー
    ///
    /// ユーザーに操作の実行権限がない場合に使用する。
    /// 認証（401）ではなく認可（403）の失敗を表す。
    #[error("権限がありません: {0}")]
    Forbidden(String),
}
