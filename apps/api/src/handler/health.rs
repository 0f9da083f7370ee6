//! # ヘルスチェックハンドラ

use axum::{Json, extract::State, http::StatusCode};
use manabiya_shared::HealthResponse;
use sqlx::PgPool;

/// 稼働確認
///
/// プロセスが応答可能であることのみを示す。依存先の状態は見ない。
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status:  "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// 接続確認
///
/// データベースへの疎通を確認する。失敗時は 503 を返す。
pub async fn readiness_check(
    State(pool): State<PgPool>,
) -> Result<Json<HealthResponse>, StatusCode> {
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!(error.category = "infrastructure", "DB 疎通確認に失敗: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        })?;

    Ok(Json(HealthResponse {
        status:  "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
