//! # ログイン・ログアウト
//!
//! ## 設計方針
//!
//! - **列挙攻撃対策**: 存在しないユーザーへのログイン試行でもダミー検証で
//!   同等の計算コストを払い、失敗理由はレスポンスで区別しない
//! - **ログアウトは常に成功**: トークンが無効でも 200 を返し、Cookie を破棄する

use axum::{Json, extract::State};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use manabiya_domain::{password::PlainPassword, token::RefreshToken, user::Email};
use manabiya_infra::generate_opaque_token;
use manabiya_shared::{ApiResponse, event_log::event, log_business_event};
use serde::{Deserialize, Serialize};

use super::{
    ACCESS_TOKEN_COOKIE,
    AuthState,
    REFRESH_TOKEN_COOKIE,
    UserView,
    build_clear_cookie,
    build_token_cookie,
};
use crate::error::ApiError;

/// ログインリクエスト
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email:    String,
    pub password: String,
}

/// ログインレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token:  String,
    pub refresh_token: String,
    pub user:          UserView,
}

/// `POST /api/auth/login`
///
/// メール/パスワード認証でトークンペアを発行する。
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<LoginResponse>>), ApiError> {
    let password = PlainPassword::new(request.password);

    let Ok(email) = Email::new(&request.email) else {
        state.password_checker.verify_dummy(&password);
        log_business_event!(
            event.category = event::category::AUTH,
            event.action = event::action::LOGIN_FAILURE,
            event.result = event::result::FAILURE,
            reason = "invalid_email_format",
        );
        return Err(ApiError::authentication_failed());
    };

    let Some((user, password_hash)) = state.user_repository.find_auth_by_email(&email).await?
    else {
        // ユーザーが存在しない場合も同等の計算コストを払う
        state.password_checker.verify_dummy(&password);
        log_business_event!(
            event.category = event::category::AUTH,
            event.action = event::action::LOGIN_FAILURE,
            event.result = event::result::FAILURE,
            reason = "user_not_found",
        );
        return Err(ApiError::authentication_failed());
    };

    let verify_result = state.password_checker.verify(&password, &password_hash)?;
    if verify_result.is_mismatch() {
        log_business_event!(
            event.category = event::category::AUTH,
            event.action = event::action::LOGIN_FAILURE,
            event.result = event::result::FAILURE,
            event.entity_type = event::entity_type::USER,
            event.entity_id = %user.id(),
            reason = "password_mismatch",
        );
        return Err(ApiError::authentication_failed());
    }

    if !user.can_login() {
        log_business_event!(
            event.category = event::category::AUTH,
            event.action = event::action::LOGIN_FAILURE,
            event.result = event::result::FAILURE,
            event.entity_type = event::entity_type::USER,
            event.entity_id = %user.id(),
            reason = "user_archived",
        );
        return Err(ApiError::authentication_failed());
    }

    let now = Utc::now();

    let access_token = state
        .token_issuer
        .issue(user.id(), user.email(), user.role(), now)?;

    let refresh_token = RefreshToken::new(
        generate_opaque_token(),
        user.id().clone(),
        now + state.refresh_token_ttl,
        now,
    );
    state.refresh_token_repository.create(&refresh_token).await?;

    state.user_repository.update_last_login(user.id(), now).await?;

    log_business_event!(
        event.category = event::category::AUTH,
        event.action = event::action::LOGIN_SUCCESS,
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
            refresh_token.token().to_string(),
            state.refresh_token_ttl,
        ));

    let response = LoginResponse {
        access_token,
        refresh_token: refresh_token.token().to_string(),
        user: UserView::from(&user),
    };

    Ok((jar, Json(ApiResponse::new(response, "ログインしました"))))
}

/// `POST /api/auth/logout`
///
/// リフレッシュトークンを失効させ、Cookie を破棄する。
/// Cookie が提示されない場合はアクセストークンの持ち主の最新トークンを
/// 失効させる。どちらもなければ Cookie の破棄のみ行う。
pub async fn logout(
    State(state): State<AuthState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<()>>), ApiError> {
    let now = Utc::now();

    if let Some(cookie) = jar.get(REFRESH_TOKEN_COOKIE) {
        state.refresh_token_repository.revoke(cookie.value(), now).await?;
    } else if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE)
        && let Ok(claims) = state.token_issuer.verify(cookie.value())
        && let Ok(user_id) = claims.user_id()
    {
        state
            .refresh_token_repository
            .revoke_latest_for_user(&user_id, now)
            .await?;
    }

    log_business_event!(
        event.category = event::category::AUTH,
        event.action = event::action::LOGOUT,
        event.result = event::result::SUCCESS,
    );

    let jar = jar
        .add(build_clear_cookie(ACCESS_TOKEN_COOKIE))
        .add(build_clear_cookie(REFRESH_TOKEN_COOKIE));

    Ok((jar, Json(ApiResponse::new((), "ログアウトしました"))))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use manabiya_domain::{password::PasswordHash, role::Role};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;
    use crate::handler::auth::test_utils::{
        RecordingNotificationSender,
        StubPasswordChecker,
        StubUserRepository,
        build_test_state,
        create_test_app,
        test_user,
    };

    fn login_request(email: &str, password: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "email": email, "password": password }).to_string(),
            ))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_正しい認証情報でトークンペアが発行される() {
        let user = test_user(Role::Student);
        let test_state = build_test_state(
            StubUserRepository::with_user(user.clone(), PasswordHash::new("stored")),
            StubPasswordChecker::matching(),
            RecordingNotificationSender::new(),
        );
        let sut = create_test_app(&test_state);

        let response = sut
            .oneshot(login_request("user@example.com", "password123"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert!(!json["data"]["access_token"].as_str().unwrap().is_empty());
        assert_eq!(
            json["data"]["refresh_token"].as_str().unwrap().len(),
            64
        );
        assert_eq!(json["data"]["user"]["email"], "user@example.com");

        // リフレッシュトークンが永続化されている
        assert_eq!(
            test_state.refresh_token_repository.active_count_for(user.id()),
            1
        );
    }

    #[tokio::test]
    async fn test_ログイン成功で最終ログイン日時が更新される() {
        let user = test_user(Role::Student);
        let test_state = build_test_state(
            StubUserRepository::with_user(user, PasswordHash::new("stored")),
            StubPasswordChecker::matching(),
            RecordingNotificationSender::new(),
        );
        let sut = create_test_app(&test_state);

        sut.oneshot(login_request("user@example.com", "password123"))
            .await
            .unwrap();

        let updated = test_state.user_repository.current_user().unwrap();
        assert!(updated.last_login_at().is_some());
    }

    #[tokio::test]
    async fn test_ログイン成功でcookieが設定される() {
        let test_state = build_test_state(
            StubUserRepository::with_user(
                test_user(Role::Student),
                PasswordHash::new("stored"),
            ),
            StubPasswordChecker::matching(),
            RecordingNotificationSender::new(),
        );
        let sut = create_test_app(&test_state);

        let response = sut
            .oneshot(login_request("user@example.com", "password123"))
            .await
            .unwrap();

        let cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();

        assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
        assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));
        assert!(cookies.iter().all(|c| c.contains("HttpOnly")));
    }

    #[tokio::test]
    async fn test_パスワード不一致は401() {
        let test_state = build_test_state(
            StubUserRepository::with_user(
                test_user(Role::Student),
                PasswordHash::new("stored"),
            ),
            StubPasswordChecker::mismatching(),
            RecordingNotificationSender::new(),
        );
        let sut = create_test_app(&test_state);

        let response = sut
            .oneshot(login_request("user@example.com", "wrong"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_存在しないユーザーも同じ401メッセージ() {
        let test_state = build_test_state(
            StubUserRepository::empty(),
            StubPasswordChecker::matching(),
            RecordingNotificationSender::new(),
        );
        let sut = create_test_app(&test_state);

        let response = sut
            .oneshot(login_request("nobody@example.com", "password123"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json = body_json(response).await;
        assert_eq!(
            json["error"]["message"],
            "メールアドレスまたはパスワードが正しくありません"
        );
    }

    #[tokio::test]
    async fn test_アーカイブ済みユーザーはログインできない() {
        let user = test_user(Role::Student)
            .archived(Utc::now())
            .unwrap();
        let test_state = build_test_state(
            StubUserRepository::with_user(user, PasswordHash::new("stored")),
            StubPasswordChecker::matching(),
            RecordingNotificationSender::new(),
        );
        let sut = create_test_app(&test_state);

        let response = sut
            .oneshot(login_request("user@example.com", "password123"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_ログアウトでリフレッシュトークンが失効する() {
        let user = test_user(Role::Student);
        let test_state = build_test_state(
            StubUserRepository::with_user(user.clone(), PasswordHash::new("stored")),
            StubPasswordChecker::matching(),
            RecordingNotificationSender::new(),
        );

        let now = Utc::now();
        let token = RefreshToken::new(
            "a".repeat(64),
            user.id().clone(),
            now + chrono::Duration::days(14),
            now,
        );
        test_state.refresh_token_repository.insert(token);

        let sut = create_test_app(&test_state);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/logout")
            .header(header::COOKIE, format!("refreshToken={}", "a".repeat(64)))
            .body(Body::empty())
            .unwrap();

        let response = sut.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            test_state
                .refresh_token_repository
                .get(&"a".repeat(64))
                .unwrap()
                .is_revoked()
        );
    }

    #[tokio::test]
    async fn test_ログアウトでcookieが破棄される() {
        let test_state = build_test_state(
            StubUserRepository::empty(),
            StubPasswordChecker::matching(),
            RecordingNotificationSender::new(),
        );
        let sut = create_test_app(&test_state);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/logout")
            .body(Body::empty())
            .unwrap();

        let response = sut.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();

        assert!(cookies.iter().any(|c| c.starts_with("accessToken=;")));
        assert!(cookies.iter().any(|c| c.starts_with("refreshToken=;")));
    }
}
