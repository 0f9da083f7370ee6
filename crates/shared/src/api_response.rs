//! # API レスポンスエンベロープ
//!
//! 公開 API の統一レスポンス形式 `{ "data": T, "message": ... }` を提供する。

use serde::{Deserialize, Serialize};

/// 公開 API の統一レスポンス型
///
/// すべての公開 API エンドポイントは `{ "data": T, "message": ... }` 形式で
/// レスポンスを返す。axum の `IntoResponse` 変換は api クレートの責務
/// （shared に axum 依存を入れない）。
///
/// ## 使用例
///
/// ```
/// use manabiya_shared::ApiResponse;
///
/// let response = ApiResponse::new("hello", "取得しました");
/// assert_eq!(response.data, "hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data:    T,
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// 新しい `ApiResponse` を作成する
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
        }
    }

    /// 定型メッセージ `"OK"` 付きのレスポンスを作成する
    pub fn ok(data: T) -> Self {
        Self::new(data, "OK")
    }
}
