//! # 認可ミドルウェア
//!
//! 認証ミドルウェアが格納した [`AuthIdentity`] を参照し、ルートに必要な
//! 権限を持つか判定する。
//!
//! ## 設計方針
//!
//! - 権限は閉じた列挙型 [`Permission`] で表現し、判定は集合の所属チェック
//! - 身元がない（認証ミドルウェアを通っていない）場合は 401
//! - 権限が足りない場合は 403

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use manabiya_domain::role::Permission;
use manabiya_shared::ErrorResponse;

use crate::{error::to_response, middleware::auth::AuthIdentity};

/// 認可ミドルウェアの状態
#[derive(Debug, Clone)]
pub struct PermissionState {
    pub required: Permission,
}

/// 認可ミドルウェア
///
/// ルートグループごとに必要な権限を `PermissionState` で指定して適用する。
pub async fn require_permission(
    State(state): State<PermissionState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(identity) = request.extensions().get::<AuthIdentity>() else {
        return to_response(ErrorResponse::unauthorized("認証が必要です"));
    };

    if !identity.has_permission(state.required) {
        return to_response(ErrorResponse::forbidden("この操作を行う権限がありません"));
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
    };
    use chrono::{Duration, Utc};
    use manabiya_domain::{
        role::Role,
        user::{Email, UserId},
    };
    use manabiya_infra::{JwtTokenIssuer, TokenIssuer};
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::auth::{AuthnState, authenticate};

    async fn ok_handler() -> &'static str {
        "ok"
    }

    fn issuer() -> Arc<JwtTokenIssuer> {
        Arc::new(JwtTokenIssuer::new("test-secret", Duration::minutes(15)))
    }

    fn create_test_app(required: Permission) -> Router {
        let authn = AuthnState {
            token_issuer:       issuer(),
            api_key_repository: None,
        };

        Router::new()
            .route("/test", get(ok_handler))
            .layer(from_fn_with_state(
                PermissionState { required },
                require_permission,
            ))
            .layer(from_fn_with_state(authn, authenticate))
    }

    fn token_for(role: Role) -> String {
        issuer()
            .issue(
                &UserId::new(),
                &Email::new("user@example.com").unwrap(),
                role,
                Utc::now(),
            )
            .unwrap()
    }

    async fn request_as(app: Router, role: Role) -> StatusCode {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/test")
            .header("Authorization", format!("Bearer {}", token_for(role)))
            .body(Body::empty())
            .unwrap();

        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_権限を持つロールは通過できる() {
        let sut = create_test_app(Permission::ContentManage);

        assert_eq!(request_as(sut, Role::Admin).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_権限のないロールは403() {
        let sut = create_test_app(Permission::UserManage);

        assert_eq!(request_as(sut, Role::Student).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_コンテンツ管理権限ではユーザー管理は403() {
        let sut = create_test_app(Permission::UserManage);

        assert_eq!(request_as(sut, Role::Creator).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_身元がない場合は401() {
        // 認証ミドルウェアを通さずに認可のみを適用した場合
        let sut = Router::new()
            .route("/test", get(ok_handler))
            .layer(from_fn_with_state(
                PermissionState {
                    required: Permission::ContentManage,
                },
                require_permission,
            ));

        let request = Request::builder()
            .method(Method::GET)
            .uri("/test")
            .body(Body::empty())
            .unwrap();

        let response = sut.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_apiキーの権限集合で判定される() {
        let identity = AuthIdentity::ApiKey {
            permissions: HashSet::from([Permission::ContentManage]),
        };

        assert!(identity.has_permission(Permission::ContentManage));
        assert!(!identity.has_permission(Permission::CacheManage));
    }
}
