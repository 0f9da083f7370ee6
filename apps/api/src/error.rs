//! # API エラー定義
//!
//! ハンドラで発生するエラーと、HTTP レスポンスへの変換を定義する。
//!
//! ## 設計方針
//!
//! - **エンベロープ統一**: すべてのエラーは `{ "error": { "message", "details"? } }`
//! - **内部情報を漏らさない**: 500 は固定メッセージ。DB エラーの詳細は
//!   ログにのみ出力する
//! - **SpanTrace の活用**: InfraError はエラー発生箇所の呼び出し経路を
//!   ログに含める

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use manabiya_domain::DomainError;
use manabiya_infra::{InfraError, TokenError};
use manabiya_shared::ErrorResponse;
use thiserror::Error;

/// API 層で発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
    /// ドメインルール違反
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// インフラ層エラー
    #[error(transparent)]
    Infra(#[from] InfraError),

    /// トークン検証エラー
    #[error(transparent)]
    Token(#[from] TokenError),

    /// 構築済みのエラーレスポンス
    #[error("{}", .0.error.message)]
    Response(ErrorResponse),
}

impl ApiError {
    /// 401 認証エラー（メッセージ固定）
    ///
    /// 存在しないユーザーとパスワード不一致を区別しない。
    pub fn authentication_failed() -> Self {
        Self::Response(ErrorResponse::unauthorized(
            "メールアドレスまたはパスワードが正しくありません",
        ))
    }

    /// 401 リフレッシュトークン不正
    pub fn invalid_refresh_token() -> Self {
        Self::Response(ErrorResponse::unauthorized(
            "リフレッシュトークンが無効です",
        ))
    }

    /// 400 リセットコード不正
    ///
    /// 期限切れとコード不一致を区別しない（総当たりのヒントを与えない）。
    pub fn invalid_reset_code() -> Self {
        Self::Response(ErrorResponse::validation_error(
            "再設定コードが正しくないか、有効期限が切れています",
        ))
    }
}

impl From<ErrorResponse> for ApiError {
    fn from(resp: ErrorResponse) -> Self {
        Self::Response(resp)
    }
}

/// `ErrorResponse` を HTTP レスポンスに変換する
///
/// shared クレートは axum に依存しないため、変換はこの層で行う。
pub fn to_response(resp: ErrorResponse) -> Response {
    let status =
        StatusCode::from_u16(resp.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(resp)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let resp = match self {
            ApiError::Domain(e) => match e {
                DomainError::Validation(msg) => ErrorResponse::validation_error(msg),
                DomainError::NotFound { entity_type, id } => {
                    ErrorResponse::not_found(format!("{entity_type} が見つかりません: {id}"))
                }
                DomainError::Conflict(msg) => ErrorResponse::conflict(msg),
                DomainError::Forbidden(msg) => ErrorResponse::forbidden(msg),
            },
            ApiError::Infra(e) => {
                tracing::error!(
                    error.category = "infrastructure",
                    span_trace = %e.span_trace(),
                    "インフラエラー: {e}"
                );
                ErrorResponse::internal_error()
            }
            ApiError::Token(e) => {
                let message = match e {
                    TokenError::Expired => "トークンの有効期限が切れています",
                    TokenError::Invalid => "トークンが不正です",
                };
                ErrorResponse::unauthorized(message)
            }
            ApiError::Response(resp) => resp,
        };

        to_response(resp)
    }
}
