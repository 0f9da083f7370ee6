//! # Manabiya API サーバー
//!
//! 講座提供サイトの公開 API と管理バックオフィス API を提供する。
//!
//! ## 役割
//!
//! - **公開 API**: 記事・講座・バナー・サイト設定の配信（キャッシュあり）
//! - **認証**: JWT アクセストークン + リフレッシュトークンローテーション
//! - **管理 API**: コンテンツ・ユーザー・設定・ストレージ・キャッシュの管理
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Browser    │────▶│     API      │────▶│  PostgreSQL  │
//! └──────────────┘     └──────┬───────┘     └──────────────┘
//!                             │
//!                   ┌─────────┴─────────┐
//!                   ▼                   ▼
//!            ┌──────────────┐    ┌──────────────┐
//!            │  S3 / MinIO  │    │     SMTP     │
//!            └──────────────┘    └──────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `API_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `API_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `JWT_SECRET` | **Yes** | アクセストークン署名シークレット |
//! | `S3_BUCKET` | **Yes** | アップロードファイル用バケット名 |
//! | `NOTIFICATION_BACKEND` | No | `smtp`（デフォルト）/ `noop` |
//!
//! その他の TTL・キャッシュ・SMTP 系の変数は [`config::ApiConfig`] を参照。
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（.env ファイルを使用）
//! cargo run -p manabiya-api
//!
//! # 本番環境
//! API_PORT=3000 DATABASE_URL=postgres://... cargo run -p manabiya-api --release
//! ```

mod app_builder;
mod config;
mod error;
mod handler;
mod middleware;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use app_builder::{AppDependencies, build_app};
use config::ApiConfig;
use manabiya_infra::{
    Argon2PasswordChecker,
    Argon2PasswordHasher,
    AwsFileStorage,
    InMemoryResponseCache,
    JwtTokenIssuer,
    db,
    notification::{NoopNotificationSender, NotificationSender, SmtpNotificationSender},
    repository::{
        PostgresApiKeyRepository,
        PostgresContentRepository,
        PostgresRefreshTokenRepository,
        PostgresSiteConfigRepository,
        PostgresUserRepository,
    },
    s3,
};
use manabiya_shared::observability::{
    MakeRequestUuidV7,
    TracingConfig,
    init_tracing,
    make_request_span,
};
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// API サーバーのエントリーポイント
///
/// 以下の順序で初期化を行う:
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. トレーシングの初期化
/// 3. アプリケーション設定の読み込み
/// 4. データベース接続とマイグレーション
/// 5. 依存の組み立てとルーターの構築
/// 6. HTTP サーバーの起動
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    // 本番環境では .env ファイルは使用せず、環境変数を直接設定する
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("api"));

    let config = ApiConfig::from_env();

    tracing::info!("API サーバーを起動します: {}:{}", config.host, config.port);

    // データベース接続とマイグレーション
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("データベースへの接続に失敗しました");
    db::run_migrations(&pool)
        .await
        .expect("マイグレーションの適用に失敗しました");

    // 通知バックエンド（開発環境では noop で無効化できる）
    let notification_sender: Arc<dyn NotificationSender> =
        if config.notification_backend == "noop" {
            Arc::new(NoopNotificationSender)
        } else {
            Arc::new(SmtpNotificationSender::new(
                &config.smtp_host,
                config.smtp_port,
                config.smtp_from.clone(),
            ))
        };

    // オブジェクトストレージ（S3_ENDPOINT_URL が設定されていれば MinIO）
    let s3_client = s3::create_client(config.s3_endpoint_url.as_deref()).await;
    let storage = Arc::new(AwsFileStorage::new(s3_client, config.s3_bucket.clone()));

    let token_issuer = Arc::new(JwtTokenIssuer::new(
        &config.jwt_secret,
        chrono::Duration::minutes(config.access_token_ttl_minutes),
    ));
    let response_cache = Arc::new(InMemoryResponseCache::new(config.cache_capacity));

    let deps = AppDependencies {
        pool:                     pool.clone(),
        user_repository:          Arc::new(PostgresUserRepository::new(pool.clone())),
        refresh_token_repository: Arc::new(PostgresRefreshTokenRepository::new(pool.clone())),
        content_repository:       Arc::new(PostgresContentRepository::new(pool.clone())),
        site_config_repository:   Arc::new(PostgresSiteConfigRepository::new(pool.clone())),
        api_key_repository:       Arc::new(PostgresApiKeyRepository::new(pool)),
        password_checker:         Arc::new(Argon2PasswordChecker::new()),
        password_hasher:          Arc::new(Argon2PasswordHasher::new()),
        token_issuer,
        notification_sender,
        response_cache,
        storage,
        access_token_ttl:         chrono::Duration::minutes(config.access_token_ttl_minutes),
        refresh_token_ttl:        chrono::Duration::days(config.refresh_token_ttl_days),
        reset_code_ttl:           chrono::Duration::minutes(config.reset_code_ttl_minutes),
        cache_ttl:                Duration::from_secs(config.cache_ttl_secs),
    };

    // レイヤーは下から上に適用される:
    // リクエスト ID 付与 → トレース → ID 伝播 → CORS → 圧縮 → ルーター
    let app = build_app(deps)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("アドレスのパースに失敗しました");

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("API サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
