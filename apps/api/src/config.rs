//! # API サーバー設定
//!
//! 環境変数から API サーバーの設定を読み込む。

use std::env;

/// API サーバーの設定
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// データベース接続 URL
    pub database_url: String,
    /// アクセストークン署名シークレット
    pub jwt_secret: String,
    /// アクセストークン有効期間（分）
    pub access_token_ttl_minutes: i64,
    /// リフレッシュトークン有効期間（日）
    pub refresh_token_ttl_days: i64,
    /// パスワード再設定コード有効期間（分）
    pub reset_code_ttl_minutes: i64,
    /// レスポンスキャッシュの容量（エントリ数）
    pub cache_capacity: usize,
    /// レスポンスキャッシュの TTL（秒）
    pub cache_ttl_secs: u64,
    /// アップロードファイル用 S3 バケット名
    pub s3_bucket: String,
    /// S3 カスタムエンドポイント（MinIO 用、未設定なら AWS S3）
    pub s3_endpoint_url: Option<String>,
    /// SMTP サーバーのホスト名
    pub smtp_host: String,
    /// SMTP サーバーのポート番号
    pub smtp_port: u16,
    /// 送信元メールアドレス
    pub smtp_from: String,
    /// 通知バックエンド（"smtp" / "noop"）
    pub notification_backend: String,
}

impl ApiConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Self {
        Self {
            host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("API_PORT")
                .expect("API_PORT が設定されていません")
                .parse()
                .expect("API_PORT は有効なポート番号である必要があります"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL が設定されていません"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET が設定されていません"),
            access_token_ttl_minutes: env_or("ACCESS_TOKEN_TTL_MINUTES", 15),
            refresh_token_ttl_days: env_or("REFRESH_TOKEN_TTL_DAYS", 14),
            reset_code_ttl_minutes: env_or("RESET_CODE_TTL_MINUTES", 30),
            cache_capacity: env_or("CACHE_CAPACITY", 1024),
            cache_ttl_secs: env_or("CACHE_TTL_SECS", 60),
            s3_bucket: env::var("S3_BUCKET").expect("S3_BUCKET が設定されていません"),
            s3_endpoint_url: env::var("S3_ENDPOINT_URL").ok(),
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port: env_or("SMTP_PORT", 1025),
            smtp_from: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "no-reply@manabiya.example.com".to_string()),
            notification_backend: env::var("NOTIFICATION_BACKEND")
                .unwrap_or_else(|_| "smtp".to_string()),
        }
    }
}

/// 環境変数を読み、未設定ならデフォルト値を使う
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
