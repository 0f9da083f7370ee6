//! # パスワード再設定
//!
//! メールで送付する 6 桁コードによるパスワード再設定フローを提供する。
//!
//! ## 設計方針
//!
//! - **アカウント存在を漏らさない**: 再設定要求はメールアドレスの存在有無に
//!   かかわらず常に 200 を返す。メール送信の失敗もレスポンスに影響しない
//! - **コードの検証**: 保存済みコードとの比較は定数時間で行い、
//!   期限切れとコード不一致はレスポンスで区別しない
//! - **全セッション失効**: パスワード変更に成功したら、そのユーザーの
//!   リフレッシュトークンをすべて失効させる

use axum::{Json, extract::State};
use chrono::Utc;
use manabiya_domain::{
    notification::password_reset_email,
    password::PlainPassword,
    user::{Email, ResetCode},
};
use manabiya_infra::generate_reset_code;
use manabiya_shared::{ApiResponse, event_log::event, log_business_event};
use serde::Deserialize;
use subtle::ConstantTimeEq as _;

use super::AuthState;
use crate::error::ApiError;

/// 再設定コード要求リクエスト
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// パスワード変更リクエスト
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub email:        String,
    pub code:         String,
    pub new_password: String,
}

/// `POST /api/auth/forgot`
///
/// パスワード再設定コードを発行し、メールで送付する。
/// アカウントの存在有無にかかわらず常に同じ 200 レスポンスを返す。
pub async fn forgot_password(
    State(state): State<AuthState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let accepted = Json(ApiResponse::new(
        (),
        "再設定コードを送信しました。メールをご確認ください",
    ));

    let Ok(email) = Email::new(&request.email) else {
        return Ok(accepted);
    };

    let Some(user) = state.user_repository.find_by_email(&email).await? else {
        return Ok(accepted);
    };

    if !user.can_login() {
        return Ok(accepted);
    }

    let Ok(code) = ResetCode::new(generate_reset_code()) else {
        // generate_reset_code は常に 6 桁の数字を返す
        return Ok(accepted);
    };

    let now = Utc::now();
    let expires_at = now + state.reset_code_ttl;
    let user = user.with_reset_code(code.clone(), expires_at, now);
    state.user_repository.save_reset_code(&user).await?;

    let message = password_reset_email(user.email(), &code, state.reset_code_ttl.num_minutes());

    // 送信失敗はログのみ。レスポンスからアカウント存在を推測させない
    if let Err(e) = state.notification_sender.send_email(&message).await {
        log_business_event!(
            event.category = event::category::NOTIFICATION,
            event.action = event::action::NOTIFICATION_FAILED,
            event.result = event::result::FAILURE,
            event.entity_type = event::entity_type::USER,
            event.entity_id = %user.id(),
            "再設定コードメールの送信に失敗: {e}"
        );
    }

    log_business_event!(
        event.category = event::category::AUTH,
        event.action = event::action::PASSWORD_RESET_REQUESTED,
        event.result = event::result::SUCCESS,
        event.entity_type = event::entity_type::USER,
        event.entity_id = %user.id(),
    );

    Ok(accepted)
}

/// `POST /api/auth/change`
///
/// 再設定コードを検証し、パスワードを変更する。
/// 成功時はそのユーザーの全リフレッシュトークンを失効させる。
pub async fn change_password(
    State(state): State<AuthState>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Ok(email) = Email::new(&request.email) else {
        return Err(ApiError::invalid_reset_code());
    };

    let Some(user) = state.user_repository.find_by_email(&email).await? else {
        return Err(ApiError::invalid_reset_code());
    };

    let now = Utc::now();

    if !user.reset_code_valid_at(now) {
        return Err(ApiError::invalid_reset_code());
    }

    let Some(stored_code) = user.reset_code() else {
        return Err(ApiError::invalid_reset_code());
    };

    // 定数時間比較（コード総当たりのタイミング情報を与えない）
    let matches: bool = stored_code
        .as_str()
        .as_bytes()
        .ct_eq(request.code.as_bytes())
        .into();
    if !matches {
        return Err(ApiError::invalid_reset_code());
    }

    // 新パスワードのバリデーションはコード検証が通ってから行う
    let new_password = PlainPassword::new_for_update(request.new_password)?;
    let hash = state.password_hasher.hash(&new_password)?;

    state
        .user_repository
        .update_password(user.id(), &hash, now)
        .await?;

    let revoked = state
        .refresh_token_repository
        .revoke_all_for_user(user.id(), now)
        .await?;

    log_business_event!(
        event.category = event::category::AUTH,
        event.action = event::action::PASSWORD_CHANGED,
        event.result = event::result::SUCCESS,
        event.entity_type = event::entity_type::USER,
        event.entity_id = %user.id(),
        revoked_sessions = revoked,
    );

    Ok(Json(ApiResponse::new((), "パスワードを変更しました")))
}
