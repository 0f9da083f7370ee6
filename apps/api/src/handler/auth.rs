//! # 認証ハンドラ
//!
//! ログイン・ログアウト・トークン更新・パスワード再設定のエンドポイントを
//! 提供する。
//!
//! ## トークン運用
//!
//! - アクセストークン: HS256 JWT。`accessToken` Cookie とレスポンスボディの
//!   両方で返す（SPA は Cookie、API クライアントは Bearer ヘッダーを使う）
//! - リフレッシュトークン: 不透明トークン。更新のたびに失効させて
//!   新しいトークンを発行する（ローテーション）

mod login;
mod password;
mod refresh;
mod session;

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use manabiya_domain::{role::Role, user::User};
use manabiya_infra::{
    PasswordChecker,
    PasswordHasher,
    TokenIssuer,
    notification::NotificationSender,
    repository::{RefreshTokenRepository, UserRepository},
};
use serde::{Deserialize, Serialize};

pub use login::{login, logout};
pub use password::{change_password, forgot_password};
pub use refresh::refresh;
pub use session::me;

/// アクセストークンを格納する Cookie 名
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// リフレッシュトークンを格納する Cookie 名
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// 認証ハンドラ群の状態
#[derive(Clone)]
pub struct AuthState {
    pub user_repository:          Arc<dyn UserRepository>,
    pub refresh_token_repository: Arc<dyn RefreshTokenRepository>,
    pub password_checker:         Arc<dyn PasswordChecker>,
    pub password_hasher:          Arc<dyn PasswordHasher>,
    pub token_issuer:             Arc<dyn TokenIssuer>,
    pub notification_sender:      Arc<dyn NotificationSender>,
    pub access_token_ttl:         Duration,
    pub refresh_token_ttl:        Duration,
    pub reset_code_ttl:           Duration,
}

/// ユーザーの公開ビュー
///
/// パスワードハッシュ・リセットコードは含めない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id:            String,
    pub email:         String,
    pub name:          String,
    pub role:          Role,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at:    DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id:            user.id().to_string(),
            email:         user.email().as_str().to_string(),
            name:          user.name().as_str().to_string(),
            role:          user.role(),
            last_login_at: user.last_login_at(),
            created_at:    user.created_at(),
        }
    }
}

/// アクセストークンとリフレッシュトークンのペア
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access_token:  String,
    pub refresh_token: String,
}

/// トークンを格納する Cookie を組み立てる
fn build_token_cookie(name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
    let max_age = time::Duration::seconds(max_age.num_seconds());

    Cookie::build((name, value))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(is_production())
        .build()
}

/// トークンを破棄する Cookie を組み立てる
fn build_clear_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(time::Duration::seconds(0))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(is_production())
        .build()
}

fn is_production() -> bool {
    std::env::var("ENV").is_ok_and(|v| v == "production")
}
