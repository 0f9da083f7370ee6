//! # 認証ミドルウェア
//!
//! リクエストから認証情報を取り出し、検証済みの身元をリクエスト拡張に
//! 格納する。
//!
//! ## 認証方式
//!
//! 1. `X-Api-Key` ヘッダー（管理ルートのみ・サーバー間連携用）:
//!    提示されたキーの SHA-256 ハッシュで `api_keys` テーブルを検索する
//! 2. `accessToken` Cookie
//! 3. `Authorization: Bearer` ヘッダー
//!
//! どれも提示されない・検証に失敗した場合は 401 でショートサーキットする。
//! ゲート内での自動リフレッシュは行わない。

use std::{collections::HashSet, sync::Arc};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use manabiya_domain::{
    role::{Permission, Role},
    user::{Email, UserId},
};
use manabiya_infra::{
    TokenError,
    TokenIssuer,
    repository::{ApiKeyRepository, hash_api_key},
};
use manabiya_shared::ErrorResponse;

use crate::{error::to_response, handler::auth::ACCESS_TOKEN_COOKIE};

/// API キーヘッダー名
const API_KEY_HEADER: &str = "X-Api-Key";

/// 認証済みの身元
///
/// 認証ミドルウェアがリクエスト拡張に格納し、後続の認可ミドルウェアと
/// ハンドラが参照する。
#[derive(Debug, Clone)]
pub enum AuthIdentity {
    /// アクセストークンで認証されたユーザー
    User {
        user_id: UserId,
        email:   Email,
        role:    Role,
    },
    /// API キーで認証されたサーバー間連携
    ApiKey {
        permissions: HashSet<Permission>,
    },
}

impl AuthIdentity {
    /// この身元が指定の権限を持つか判定する
    pub fn has_permission(&self, required: Permission) -> bool {
        match self {
            Self::User { role, .. } => role.has_permission(required),
            Self::ApiKey { permissions } => permissions.contains(&required),
        }
    }

    /// ユーザーの身元であればユーザー ID を返す
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::User { user_id, .. } => Some(user_id),
            Self::ApiKey { .. } => None,
        }
    }
}

/// 認証ミドルウェアの状態
#[derive(Clone)]
pub struct AuthnState {
    pub token_issuer:       Arc<dyn TokenIssuer>,
    /// 管理ルートでのみ `Some`。公開認証ルートでは API キーを受け付けない。
    pub api_key_repository: Option<Arc<dyn ApiKeyRepository>>,
}

/// 認証ミドルウェア
///
/// 検証に成功すると [`AuthIdentity`] をリクエスト拡張に格納する。
pub async fn authenticate(
    State(state): State<AuthnState>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    // API キー認証（管理ルートのみ）
    if let Some(api_key_repository) = &state.api_key_repository
        && let Some(presented) = request.headers().get(API_KEY_HEADER)
    {
        let Ok(presented) = presented.to_str() else {
            return unauthorized("API キーが不正です");
        };

        let key = match api_key_repository.find_by_key_hash(&hash_api_key(presented)).await {
            Ok(Some(key)) => key,
            Ok(None) => return unauthorized("API キーが不正です"),
            Err(e) => {
                tracing::error!(
                    error.category = "infrastructure",
                    span_trace = %e.span_trace(),
                    "API キー検索に失敗: {e}"
                );
                return to_response(ErrorResponse::internal_error());
            }
        };

        if key.is_revoked() {
            return unauthorized("API キーは失効しています");
        }

        request.extensions_mut().insert(AuthIdentity::ApiKey {
            permissions: key.permissions().clone(),
        });
        return next.run(request).await;
    }

    // アクセストークン認証: Cookie 優先、次に Bearer ヘッダー
    let token = jar
        .get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(&request));

    let Some(token) = token else {
        return unauthorized("認証が必要です");
    };

    let claims = match state.token_issuer.verify(&token) {
        Ok(claims) => claims,
        Err(TokenError::Expired) => {
            return unauthorized("トークンの有効期限が切れています");
        }
        Err(TokenError::Invalid) => return unauthorized("トークンが不正です"),
    };

    let Ok(user_id) = claims.user_id() else {
        return unauthorized("トークンが不正です");
    };
    let Ok(email) = Email::new(&claims.email) else {
        return unauthorized("トークンが不正です");
    };

    request.extensions_mut().insert(AuthIdentity::User {
        user_id,
        email,
        role: claims.role,
    });

    next.run(request).await
}

fn bearer_token(request: &Request<Body>) -> Option<String> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn unauthorized(message: &str) -> Response {
    to_response(ErrorResponse::unauthorized(message))
}
