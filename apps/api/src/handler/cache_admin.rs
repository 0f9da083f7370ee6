//! # キャッシュ管理ハンドラ
//!
//! レスポンスキャッシュの統計取得と全破棄を提供する。

use std::sync::Arc;

use axum::{Json, extract::State};
use manabiya_infra::{CacheStats, ResponseCache};
use manabiya_shared::ApiResponse;
use serde::Serialize;

use crate::error::ApiError;

/// キャッシュ管理ハンドラ群の状態
#[derive(Clone)]
pub struct CacheAdminState {
    pub response_cache: Arc<dyn ResponseCache>,
}

/// キャッシュ破棄の結果
#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub removed: usize,
}

/// `GET /api/admin/cache`
pub async fn cache_stats(
    State(state): State<CacheAdminState>,
) -> Result<Json<ApiResponse<CacheStats>>, ApiError> {
    let stats = state.response_cache.stats().await?;

    Ok(Json(ApiResponse::ok(stats)))
}

/// `DELETE /api/admin/cache`
pub async fn clear_cache(
    State(state): State<CacheAdminState>,
) -> Result<Json<ApiResponse<ClearCacheResponse>>, ApiError> {
    let removed = state.response_cache.clear().await?;

    tracing::info!(removed, "レスポンスキャッシュを全破棄");

    Ok(Json(ApiResponse::new(
        ClearCacheResponse { removed },
        "キャッシュを破棄しました",
    )))
}
