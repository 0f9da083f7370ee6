//! # エラーレスポンスエンベロープ
//!
//! 全エンドポイント共通のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は api クレートの責務（shared に axum 依存を入れない）
//! - HTTP ステータスコードはボディに含めず、`status` フィールド（serde skip）で運ぶ
//! - よく使うエラー種別は便利コンストラクタで提供する

use serde::{Deserialize, Serialize};

/// エラーボディ `{ "message": ..., "details"? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    /// 補足情報（バリデーションエラーのフィールド一覧など）。
    /// 内部エラーでは決して設定しない。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// エラーレスポンス `{ "error": { "message": ..., "details"? } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error:  ErrorBody,
    /// HTTP ステータスコード（ボディには出力しない）
    #[serde(skip)]
    pub status: u16,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            error:  ErrorBody {
                message: message.into(),
                details: None,
            },
            status,
        }
    }

    /// `details` を付与する
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }

    /// 400 Validation Error
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    /// 401 Unauthorized
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    /// 403 Forbidden
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, message)
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    /// 409 Conflict
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(409, message)
    }

    /// 500 Internal Server Error
    ///
    /// message は固定値（内部情報を漏らさないため）。`details` も常に空。
    pub fn internal_error() -> Self {
        Self::new(500, "内部エラーが発生しました")
    }
}
