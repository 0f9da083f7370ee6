//! # トークン更新
//!
//! リフレッシュトークンのローテーションを行う。
//!
//! ## 設計方針
//!
//! - **ローテーション**: 提示されたトークンを失効させてから新しいペアを
//!   発行する。同じトークンは二度と使えない
//! - **失効済みトークンの検知**: 失効済みトークンでの更新要求は
//!   盗難の兆候として警告ログを出す

use axum::{Json, extract::State};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use manabiya_domain::token::RefreshToken;
use manabiya_infra::generate_opaque_token;
use manabiya_shared::{ApiResponse, event_log::event, log_business_event};
use serde::Deserialize;

use super::{
    ACCESS_TOKEN_COOKIE,
    AuthState,
    REFRESH_TOKEN_COOKIE,
    TokenPairResponse,
    build_token_cookie,
};
use crate::error::ApiError;

/// トークン更新リクエスト
///
/// Cookie を使わないクライアント向けにボディでも受け付ける。
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// `POST /api/auth/refresh`
///
/// リフレッシュトークンをローテーションし、新しいトークンペアを返す。
/// トークンは Cookie を優先し、なければリクエストボディから取得する。
pub async fn refresh(
    State(state): State<AuthState>,
    jar: CookieJar,
    request: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, Json<ApiResponse<TokenPairResponse>>), ApiError> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| request.and_then(|Json(r)| r.refresh_token));

    let Some(presented) = presented else {
        return Err(ApiError::invalid_refresh_token());
    };

    let now = Utc::now();

    let Some(stored) = state.refresh_token_repository.find(&presented).await? else {
        return Err(ApiError::invalid_refresh_token());
    };

    if !stored.can_refresh(now) {
        if stored.is_revoked() {
            // 失効済みトークンの再利用はトークン盗難の兆候
            tracing::warn!(
                event.category = event::category::AUTH,
                event.entity_type = event::entity_type::REFRESH_TOKEN,
                user_id = %stored.user_id(),
                "失効済みリフレッシュトークンによる更新要求"
            );
        }
        return Err(ApiError::invalid_refresh_token());
    }

    // ローテーション: 新しいペアを発行する前に必ず失効させる。
    // 同じトークンを提示した並行要求のうち、失効を取れた一方だけが
    // 新しいペアを受け取る
    let revoked = state.refresh_token_repository.revoke(&presented, now).await?;
    if revoked == 0 {
        tracing::warn!(
            event.category = event::category::AUTH,
            event.entity_type = event::entity_type::REFRESH_TOKEN,
            user_id = %stored.user_id(),
            "並行する更新要求により既に失効したトークン"
        );
        return Err(ApiError::invalid_refresh_token());
    }

    let Some(user) = state.user_repository.find_by_id(stored.user_id()).await? else {
        return Err(ApiError::invalid_refresh_token());
    };

    if !user.can_login() {
        return Err(ApiError::invalid_refresh_token());
    }

    let access_token = state
        .token_issuer
        .issue(user.id(), user.email(), user.role(), now)?;

    let next_token = RefreshToken::new(
        generate_opaque_token(),
        user.id().clone(),
        now + state.refresh_token_ttl,
        now,
    );
    state.refresh_token_repository.create(&next_token).await?;

    log_business_event!(
        event.category = event::category::AUTH,
        event.action = event::action::TOKEN_REFRESHED,
        event.result = event::result::SUCCESS,
        event.entity_type = event::entity_type::USER,
        event.entity_id = %user.id(),
    );

    let jar = jar
        .add(build_token_cookie(
            ACCESS_TOKEN_COOKIE,
            access_token.clone(),
            state.access_token_ttl,
        ))
        .add(build_token_cookie(
            REFRESH_TOKEN_COOKIE,
            next_token.token().to_string(),
            state.refresh_token_ttl,
        ));

    let response = TokenPairResponse {
        access_token,
        refresh_token: next_token.token().to_string(),
    };

    Ok((jar, Json(ApiResponse::new(response, "トークンを更新しました"))))
}
