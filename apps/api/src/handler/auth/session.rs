//! # ログイン中ユーザーの取得

use axum::{Extension, Json, extract::State};
use manabiya_domain::DomainError;
use manabiya_shared::{ApiResponse, ErrorResponse};

use super::{AuthState, UserView};
use crate::{error::ApiError, middleware::auth::AuthIdentity};

/// `GET /api/auth/me`
///
/// アクセストークンの持ち主の情報を返す。API キーの身元では利用できない。
pub async fn me(
    State(state): State<AuthState>,
    Extension(identity): Extension<AuthIdentity>,
) -> Result<Json<ApiResponse<UserView>>, ApiError> {
    let Some(user_id) = identity.user_id() else {
        return Err(ErrorResponse::forbidden(
            "この操作はユーザーのみ利用できます",
        )
        .into());
    };

    let Some(user) = state.user_repository.find_by_id(user_id).await? else {
        return Err(DomainError::NotFound {
            entity_type: "User",
            id:          user_id.to_string(),
        }
        .into());
    };

    Ok(Json(ApiResponse::ok(UserView::from(&user))))
}
