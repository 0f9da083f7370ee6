//! # ユーザー管理ハンドラ
//!
//! 管理画面からのユーザーの一覧・アーカイブ・復元を提供する。
//!
//! ## 設計方針
//!
//! - ユーザーのアーカイブは論理削除。ログイン不可になり、
//!   そのユーザーの全リフレッシュトークンを即時失効させる
//! - ユーザー単位のキャッシュ（`/api/auth/me`）も無効化する

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use manabiya_domain::{
    DomainError,
    user::{User, UserId},
};
use manabiya_infra::{
    ResponseCache,
    repository::{RefreshTokenRepository, UserRepository},
};
use manabiya_shared::{ApiResponse, event_log::event, log_business_event};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handler::content::SetActiveRequest;

/// ユーザー管理ハンドラ群の状態
#[derive(Clone)]
pub struct UserAdminState {
    pub user_repository:          Arc<dyn UserRepository>,
    pub refresh_token_repository: Arc<dyn RefreshTokenRepository>,
    pub response_cache:           Arc<dyn ResponseCache>,
}

/// 管理画面向けのユーザービュー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUserView {
    pub id:            String,
    pub email:         String,
    pub name:          String,
    pub role:          manabiya_domain::role::Role,
    pub status:        String,
    pub archived_at:   Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at:    DateTime<Utc>,
}

impl From<&User> for AdminUserView {
    fn from(user: &User) -> Self {
        let (status, archived_at) = user.status().to_db();

        Self {
            id: user.id().to_string(),
            email: user.email().as_str().to_string(),
            name: user.name().as_str().to_string(),
            role: user.role(),
            status: status.to_string(),
            archived_at,
            last_login_at: user.last_login_at(),
            created_at: user.created_at(),
        }
    }
}

/// `GET /api/admin/users`
///
/// アーカイブ済みを含む全ユーザーを返す。
pub async fn list_users(
    State(state): State<UserAdminState>,
) -> Result<Json<ApiResponse<Vec<AdminUserView>>>, ApiError> {
    let users = state.user_repository.find_all().await?;
    let views: Vec<AdminUserView> = users.iter().map(AdminUserView::from).collect();

    Ok(Json(ApiResponse::ok(views)))
}

/// `PUT /api/admin/users/{id}/active`
///
/// `{"active": true}` で復元、`{"active": false}` でアーカイブする。
pub async fn set_user_active(
    State(state): State<UserAdminState>,
    Path(id): Path<String>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<AdminUserView>>, ApiError> {
    let user = fetch_user(&state, &id).await?;

    let view = if request.active {
        restore(&state, user).await?
    } else {
        archive(&state, user).await?
    };

    Ok(Json(ApiResponse::new(view, "公開状態を更新しました")))
}

/// `PUT /api/admin/users/{id}/restore`
pub async fn restore_user(
    State(state): State<UserAdminState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AdminUserView>>, ApiError> {
    let user = fetch_user(&state, &id).await?;
    let view = restore(&state, user).await?;

    Ok(Json(ApiResponse::new(view, "復元しました")))
}

/// `DELETE /api/admin/users/{id}`
///
/// 論理削除。全リフレッシュトークンを失効させる。
pub async fn archive_user(
    State(state): State<UserAdminState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AdminUserView>>, ApiError> {
    let user = fetch_user(&state, &id).await?;
    let view = archive(&state, user).await?;

    Ok(Json(ApiResponse::new(view, "アーカイブしました")))
}

async fn fetch_user(state: &UserAdminState, id: &str) -> Result<User, ApiError> {
    let id = Uuid::parse_str(id)
        .map(UserId::from_uuid)
        .map_err(|_| DomainError::Validation(format!("不正なユーザー ID: {id}")))?;

    let Some(user) = state.user_repository.find_by_id(&id).await? else {
        return Err(DomainError::NotFound {
            entity_type: "User",
            id:          id.to_string(),
        }
        .into());
    };

    Ok(user)
}

async fn archive(state: &UserAdminState, user: User) -> Result<AdminUserView, ApiError> {
    let now = Utc::now();
    let archived = user.archived(now)?;

    state.user_repository.save_status(&archived).await?;

    // ログイン不可にすると同時に既存セッションも閉じる
    let revoked = state
        .refresh_token_repository
        .revoke_all_for_user(archived.id(), now)
        .await?;

    state
        .response_cache
        .invalidate(&archived.id().to_string())
        .await?;

    log_business_event!(
        event.category = event::category::USER,
        event.action = event::action::USER_ARCHIVED,
        event.result = event::result::SUCCESS,
        event.entity_type = event::entity_type::USER,
        event.entity_id = %archived.id(),
        revoked_sessions = revoked,
    );

    Ok(AdminUserView::from(&archived))
}

async fn restore(state: &UserAdminState, user: User) -> Result<AdminUserView, ApiError> {
    let now = Utc::now();
    let restored = user.restored(now)?;

    state.user_repository.save_status(&restored).await?;

    log_business_event!(
        event.category = event::category::USER,
        event.action = event::action::USER_RESTORED,
        event.result = event::result::SUCCESS,
        event.entity_type = event::entity_type::USER,
        event.entity_id = %restored.id(),
    );

    Ok(AdminUserView::from(&restored))
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode, header},
        routing::{delete, get, put},
    };
    use chrono::Duration;
    use manabiya_domain::{role::Role, token::RefreshToken};
    use manabiya_infra::InMemoryResponseCache;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;
    use crate::handler::auth::test_utils::{
        InMemoryRefreshTokenRepository,
        StubUserRepository,
        test_user,
    };

    struct TestUserApp {
        users:  Arc<StubUserRepository>,
        tokens: Arc<InMemoryRefreshTokenRepository>,
        cache:  Arc<InMemoryResponseCache>,
        app:    Router,
    }

    fn create_test_app(user_repository: StubUserRepository) -> TestUserApp {
        let users = Arc::new(user_repository);
        let tokens = Arc::new(InMemoryRefreshTokenRepository::new());
        let cache = Arc::new(InMemoryResponseCache::new(16));

        let state = UserAdminState {
            user_repository:          users.clone(),
            refresh_token_repository: tokens.clone(),
            response_cache:           cache.clone(),
        };

        let app = Router::new()
            .route("/api/admin/users", get(list_users))
            .route("/api/admin/users/{id}/active", put(set_user_active))
            .route("/api/admin/users/{id}/restore", put(restore_user))
            .route("/api/admin/users/{id}", delete(archive_user))
            .with_state(state);

        TestUserApp {
            users,
            tokens,
            cache,
            app,
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_一覧はパスワード情報を含まない() {
        let user = test_user(Role::Student);
        let sut = create_test_app(StubUserRepository::with_user(
            user,
            manabiya_domain::password::PasswordHash::new("stored"),
        ));

        let response = sut
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/admin/users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
        assert!(json["data"][0].get("password_hash").is_none());
        assert!(json["data"][0].get("reset_code").is_none());
    }

    #[tokio::test]
    async fn test_アーカイブで全リフレッシュトークンが失効する() {
        let user = test_user(Role::Student);
        let user_id = user.id().clone();
        let sut = create_test_app(StubUserRepository::with_user(
            user,
            manabiya_domain::password::PasswordHash::new("stored"),
        ));

        let now = Utc::now();
        for i in 0..3 {
            sut.tokens.insert(RefreshToken::new(
                format!("{i}").repeat(64),
                user_id.clone(),
                now + Duration::days(14),
                now,
            ));
        }

        // ユーザースコープのキャッシュも用意する
        sut.cache
            .put(
                &format!("GET:/api/auth/me:{user_id}"),
                "{}".to_string(),
                std::time::Duration::from_secs(60),
            )
            .await
            .unwrap();

        let response = sut
            .app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri(format!("/api/admin/users/{user_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sut.tokens.active_count_for(&user_id), 0);
        assert!(!sut.users.current_user().unwrap().can_login());

        // ユーザースコープのキャッシュが無効化されている
        assert_eq!(
            sut.cache
                .get(&format!("GET:/api/auth/me:{user_id}"))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_activeをtrueにすると復元される() {
        let user = test_user(Role::Student).archived(Utc::now()).unwrap();
        let user_id = user.id().clone();
        let sut = create_test_app(StubUserRepository::with_user(
            user,
            manabiya_domain::password::PasswordHash::new("stored"),
        ));

        let request = Request::builder()
            .method(Method::PUT)
            .uri(format!("/api/admin/users/{user_id}/active"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "active": true }).to_string(),
            ))
            .unwrap();

        let response = sut.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(sut.users.current_user().unwrap().can_login());
    }

    #[tokio::test]
    async fn test_アクティブユーザーの復元は409() {
        let user = test_user(Role::Student);
        let user_id = user.id().clone();
        let sut = create_test_app(StubUserRepository::with_user(
            user,
            manabiya_domain::password::PasswordHash::new("stored"),
        ));

        let response = sut
            .app
            .oneshot(
                Request::builder()
                    .method(Method::PUT)
                    .uri(format!("/api/admin/users/{user_id}/restore"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_存在しないユーザーは404() {
        let sut = create_test_app(StubUserRepository::empty());

        let response = sut
            .app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri(format!("/api/admin/users/{}", Uuid::now_v7()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
