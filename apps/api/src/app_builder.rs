//! # アプリケーション組み立て
//!
//! 依存の束からルーターを組み立てる。main からルーティング定義を
//! 分離し、テストでスタブ依存を注入できるようにする。
//!
//! ## ルート構成
//!
//! | グループ | 認証 | キャッシュ |
//! |---------|------|-----------|
//! | `/health` | 不要 | なし |
//! | `/api/{posts,courses,banners}`、`/api/config` | 不要 | あり |
//! | `/api/auth/*`（me 以外） | 不要 | なし |
//! | `/api/auth/me` | アクセストークン | あり（ユーザー単位） |
//! | `/api/admin/*` | アクセストークンまたは API キー | なし |

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use manabiya_domain::role::Permission;
use manabiya_infra::{
    FileStorage,
    PasswordChecker,
    PasswordHasher,
    ResponseCache,
    TokenIssuer,
    notification::NotificationSender,
    repository::{
        ApiKeyRepository,
        ContentRepository,
        RefreshTokenRepository,
        SiteConfigRepository,
        UserRepository,
    },
};
use sqlx::PgPool;

use crate::{
    handler::{
        auth::{
            AuthState,
            change_password,
            forgot_password,
            login,
            logout,
            me,
            refresh,
        },
        cache_admin::{CacheAdminState, cache_stats, clear_cache},
        content::{
            ContentState,
            archive_content,
            list_admin_content,
            list_banners,
            list_courses,
            list_posts,
            restore_content,
            set_content_active,
        },
        health::{health_check, readiness_check},
        site_config::{
            SiteConfigState,
            get_admin_config,
            get_public_config,
            update_config,
        },
        storage::{StorageState, delete_object, list_objects},
        users::{
            UserAdminState,
            archive_user,
            list_users,
            restore_user,
            set_user_active,
        },
    },
    middleware::{
        auth::{AuthnState, authenticate},
        permission::{PermissionState, require_permission},
        response_cache::{ResponseCacheState, cache_response},
    },
};

/// アプリケーションの依存一式
pub struct AppDependencies {
    pub pool:                     PgPool,
    pub user_repository:          Arc<dyn UserRepository>,
    pub refresh_token_repository: Arc<dyn RefreshTokenRepository>,
    pub content_repository:       Arc<dyn ContentRepository>,
    pub site_config_repository:   Arc<dyn SiteConfigRepository>,
    pub api_key_repository:       Arc<dyn ApiKeyRepository>,
    pub password_checker:         Arc<dyn PasswordChecker>,
    pub password_hasher:          Arc<dyn PasswordHasher>,
    pub token_issuer:             Arc<dyn TokenIssuer>,
    pub notification_sender:      Arc<dyn NotificationSender>,
    pub response_cache:           Arc<dyn ResponseCache>,
    pub storage:                  Arc<dyn FileStorage>,
    pub access_token_ttl:         chrono::Duration,
    pub refresh_token_ttl:        chrono::Duration,
    pub reset_code_ttl:           chrono::Duration,
    pub cache_ttl:                Duration,
}

/// 依存からルーター全体を組み立てる
pub fn build_app(deps: AppDependencies) -> Router {
    let auth_state = AuthState {
        user_repository:          deps.user_repository.clone(),
        refresh_token_repository: deps.refresh_token_repository.clone(),
        password_checker:         deps.password_checker,
        password_hasher:          deps.password_hasher,
        token_issuer:             deps.token_issuer.clone(),
        notification_sender:      deps.notification_sender,
        access_token_ttl:         deps.access_token_ttl,
        refresh_token_ttl:        deps.refresh_token_ttl,
        reset_code_ttl:           deps.reset_code_ttl,
    };

    let content_state = ContentState {
        content_repository: deps.content_repository,
        response_cache:     deps.response_cache.clone(),
    };

    let site_config_state = SiteConfigState {
        site_config_repository: deps.site_config_repository,
        response_cache:         deps.response_cache.clone(),
    };

    let user_admin_state = UserAdminState {
        user_repository:          deps.user_repository,
        refresh_token_repository: deps.refresh_token_repository,
        response_cache:           deps.response_cache.clone(),
    };

    let cache_state = ResponseCacheState {
        cache: deps.response_cache.clone(),
        ttl:   deps.cache_ttl,
    };

    // 公開ルートではアクセストークンのみ、管理ルートでは API キーも受け付ける
    let authn_user = AuthnState {
        token_issuer:       deps.token_issuer.clone(),
        api_key_repository: None,
    };
    let authn_admin = AuthnState {
        token_issuer:       deps.token_issuer,
        api_key_repository: Some(deps.api_key_repository),
    };

    let health_routes = Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .with_state(deps.pool);

    // 公開コンテンツ・公開設定（キャッシュあり）
    let public_routes = Router::new()
        .route("/api/posts", get(list_posts))
        .route("/api/courses", get(list_courses))
        .route("/api/banners", get(list_banners))
        .with_state(content_state.clone())
        .merge(
            Router::new()
                .route("/api/config", get(get_public_config))
                .with_state(site_config_state.clone()),
        )
        .layer(from_fn_with_state(cache_state.clone(), cache_response));

    // 認証ルート（キャッシュなし）
    let auth_routes = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/forgot", post(forgot_password))
        .route("/api/auth/change", post(change_password))
        .with_state(auth_state.clone());

    // 下に行くほど外側のレイヤー: キャッシュキーに身元を含めるため
    // 認証をキャッシュより外側に置く
    let me_routes = Router::new()
        .route("/api/auth/me", get(me))
        .with_state(auth_state)
        .layer(from_fn_with_state(cache_state, cache_response))
        .layer(from_fn_with_state(authn_user, authenticate));

    // 管理ルート: グループごとに必要な権限を指定する
    let content_admin = Router::new()
        .route("/api/admin/content/{kind}", get(list_admin_content))
        .route(
            "/api/admin/content/{kind}/{id}/active",
            put(set_content_active),
        )
        .route(
            "/api/admin/content/{kind}/{id}/restore",
            put(restore_content),
        )
        .route("/api/admin/content/{kind}/{id}", delete(archive_content))
        .with_state(content_state)
        .layer(from_fn_with_state(
            PermissionState {
                required: Permission::ContentManage,
            },
            require_permission,
        ));

    let user_admin = Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}/active", put(set_user_active))
        .route("/api/admin/users/{id}/restore", put(restore_user))
        .route("/api/admin/users/{id}", delete(archive_user))
        .with_state(user_admin_state)
        .layer(from_fn_with_state(
            PermissionState {
                required: Permission::UserManage,
            },
            require_permission,
        ));

    let config_admin = Router::new()
        .route(
            "/api/admin/config",
            get(get_admin_config).put(update_config),
        )
        .with_state(site_config_state)
        .layer(from_fn_with_state(
            PermissionState {
                required: Permission::ConfigManage,
            },
            require_permission,
        ));

    let storage_admin = Router::new()
        .route("/api/admin/storage", get(list_objects))
        .route("/api/admin/storage/{*key}", delete(delete_object))
        .with_state(StorageState {
            storage: deps.storage,
        })
        .layer(from_fn_with_state(
            PermissionState {
                required: Permission::StorageManage,
            },
            require_permission,
        ));

    let cache_admin = Router::new()
        .route("/api/admin/cache", get(cache_stats).delete(clear_cache))
        .with_state(CacheAdminState {
            response_cache: deps.response_cache,
        })
        .layer(from_fn_with_state(
            PermissionState {
                required: Permission::CacheManage,
            },
            require_permission,
        ));

    let admin_routes = content_admin
        .merge(user_admin)
        .merge(config_admin)
        .merge(storage_admin)
        .merge(cache_admin)
        .layer(from_fn_with_state(authn_admin, authenticate));

    health_routes
        .merge(public_routes)
        .merge(auth_routes)
        .merge(me_routes)
        .merge(admin_routes)
}
