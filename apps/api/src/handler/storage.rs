//! # ストレージ管理ハンドラ
//!
//! アップロードファイル（S3）の一覧と削除を提供する。
//! アップロード自体は CMS 側がプリサイン URL で行うため、この API は
//! 一覧と削除のみを扱う。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use manabiya_infra::{FileStorage, StoredObject};
use manabiya_shared::{ApiResponse, event_log::event, log_business_event};
use serde::Deserialize;

use crate::error::ApiError;

/// ストレージハンドラ群の状態
#[derive(Clone)]
pub struct StorageState {
    pub storage: Arc<dyn FileStorage>,
}

/// 一覧取得のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct ListObjectsQuery {
    /// キーのプレフィックスで絞り込む
    pub prefix: Option<String>,
}

/// `GET /api/admin/storage?prefix=`
pub async fn list_objects(
    State(state): State<StorageState>,
    Query(query): Query<ListObjectsQuery>,
) -> Result<Json<ApiResponse<Vec<StoredObject>>>, ApiError> {
    let objects = state.storage.list(query.prefix.as_deref()).await?;

    Ok(Json(ApiResponse::ok(objects)))
}

/// `DELETE /api/admin/storage/{*key}`
///
/// キーはスラッシュを含むため、ワイルドカードで受ける。
pub async fn delete_object(
    State(state): State<StorageState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.storage.delete(&key).await?;

    log_business_event!(
        event.category = event::category::STORAGE,
        event.action = event::action::FILE_DELETED,
        event.result = event::result::SUCCESS,
        key = %key,
    );

    Ok(Json(ApiResponse::new((), "削除しました")))
}
