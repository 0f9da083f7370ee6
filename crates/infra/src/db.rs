//! # データベース接続管理
//!
//! PostgreSQL への接続プールの作成とマイグレーションの実行を提供する。

use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::error::InfraError;

/// PostgreSQL 接続プールを作成する
///
/// # 設定
///
/// - 最大接続数: 10
/// - 接続取得タイムアウト: 5 秒
pub async fn create_pool(database_url: &str) -> Result<PgPool, InfraError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// マイグレーションを実行する
///
/// `migrations/` ディレクトリの SQL をビルド時に埋め込み、起動時に
/// 未適用のものだけを順番に適用する。
pub async fn run_migrations(pool: &PgPool) -> Result<(), InfraError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| InfraError::unexpected(format!("マイグレーション失敗: {e}")))?;

    Ok(())
}
