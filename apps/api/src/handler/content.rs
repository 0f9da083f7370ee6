//! # コンテンツハンドラ
//!
//! 公開コンテンツ（記事・講座・バナー）の一覧と、管理向けの
//! 公開/アーカイブ/復元操作を提供する。
//!
//! ## 設計方針
//!
//! - 公開一覧はアクティブなコンテンツのみを返す。講師は公開 API には
//!   露出しない（管理ルートからのみ参照できる）
//! - 管理操作が成功したら、対応する公開一覧のキャッシュを部分一致で
//!   無効化する

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use manabiya_domain::{
    DomainError,
    content::{ContentId, ContentItem, ContentKind, ContentSummary},
};
use manabiya_infra::{ResponseCache, repository::ContentRepository};
use manabiya_shared::{ApiResponse, event_log::event, log_business_event};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// コンテンツハンドラ群の状態
#[derive(Clone)]
pub struct ContentState {
    pub content_repository: Arc<dyn ContentRepository>,
    pub response_cache:     Arc<dyn ResponseCache>,
}

/// 公開/アーカイブ切り替えリクエスト
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// 管理画面向けのコンテンツビュー
///
/// アーカイブ済みを含む全件表示用。ステータスと日時を含む。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminContentView {
    pub id:          String,
    pub title:       String,
    pub description: Option<String>,
    pub image_url:   Option<String>,
    pub status:      String,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at:  DateTime<Utc>,
    pub updated_at:  DateTime<Utc>,
}

impl From<&ContentItem> for AdminContentView {
    fn from(item: &ContentItem) -> Self {
        let (status, archived_at) = item.status().to_db();

        Self {
            id: item.id().to_string(),
            title: item.title().to_string(),
            description: item.description().map(str::to_string),
            image_url: item.image_url().map(str::to_string),
            status: status.to_string(),
            archived_at,
            created_at: item.created_at(),
            updated_at: item.updated_at(),
        }
    }
}

// ===== 公開エンドポイント =====

/// `GET /api/posts`
pub async fn list_posts(
    State(state): State<ContentState>,
) -> Result<Json<ApiResponse<Vec<ContentSummary>>>, ApiError> {
    list_active(&state, ContentKind::Posts).await
}

/// `GET /api/courses`
pub async fn list_courses(
    State(state): State<ContentState>,
) -> Result<Json<ApiResponse<Vec<ContentSummary>>>, ApiError> {
    list_active(&state, ContentKind::Courses).await
}

/// `GET /api/banners`
pub async fn list_banners(
    State(state): State<ContentState>,
) -> Result<Json<ApiResponse<Vec<ContentSummary>>>, ApiError> {
    list_active(&state, ContentKind::Banners).await
}

async fn list_active(
    state: &ContentState,
    kind: ContentKind,
) -> Result<Json<ApiResponse<Vec<ContentSummary>>>, ApiError> {
    let items = state.content_repository.find_all_active(kind).await?;
    let summaries: Vec<ContentSummary> = items.iter().map(ContentSummary::from).collect();

    Ok(Json(ApiResponse::ok(summaries)))
}

// ===== 管理エンドポイント =====

/// `GET /api/admin/content/{kind}`
///
/// アーカイブ済みを含む全件を返す。講師もここから参照できる。
pub async fn list_admin_content(
    State(state): State<ContentState>,
    Path(kind): Path<String>,
) -> Result<Json<ApiResponse<Vec<AdminContentView>>>, ApiError> {
    let kind: ContentKind = kind.parse()?;

    let items = state.content_repository.find_all(kind).await?;
    let views: Vec<AdminContentView> = items.iter().map(AdminContentView::from).collect();

    Ok(Json(ApiResponse::ok(views)))
}

/// `PUT /api/admin/content/{kind}/{id}/active`
///
/// `{"active": true}` で公開、`{"active": false}` でアーカイブする。
pub async fn set_content_active(
    State(state): State<ContentState>,
    Path((kind, id)): Path<(String, String)>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<AdminContentView>>, ApiError> {
    let (kind, item) = fetch_content(&state, &kind, &id).await?;
    let now = Utc::now();

    let (updated, action) = if request.active {
        (item.restored(now)?, event::action::CONTENT_ACTIVATED)
    } else {
        (item.archived(now)?, event::action::CONTENT_ARCHIVED)
    };

    save_and_invalidate(&state, kind, &updated, action).await?;

    Ok(Json(ApiResponse::new(
        AdminContentView::from(&updated),
        "公開状態を更新しました",
    )))
}

/// `PUT /api/admin/content/{kind}/{id}/restore`
pub async fn restore_content(
    State(state): State<ContentState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<AdminContentView>>, ApiError> {
    let (kind, item) = fetch_content(&state, &kind, &id).await?;

    let restored = item.restored(Utc::now())?;
    save_and_invalidate(&state, kind, &restored, event::action::CONTENT_RESTORED).await?;

    Ok(Json(ApiResponse::new(
        AdminContentView::from(&restored),
        "復元しました",
    )))
}

/// `DELETE /api/admin/content/{kind}/{id}`
///
/// 論理削除。物理削除は行わない。
pub async fn archive_content(
    State(state): State<ContentState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<AdminContentView>>, ApiError> {
    let (kind, item) = fetch_content(&state, &kind, &id).await?;

    let archived = item.archived(Utc::now())?;
    save_and_invalidate(&state, kind, &archived, event::action::CONTENT_ARCHIVED).await?;

    Ok(Json(ApiResponse::new(
        AdminContentView::from(&archived),
        "アーカイブしました",
    )))
}

/// パスパラメータを解決してコンテンツを取得する
async fn fetch_content(
    state: &ContentState,
    kind: &str,
    id: &str,
) -> Result<(ContentKind, ContentItem), ApiError> {
    let kind: ContentKind = kind.parse()?;

    let id = Uuid::parse_str(id)
        .map(ContentId::from_uuid)
        .map_err(|_| DomainError::Validation(format!("不正なコンテンツ ID: {id}")))?;

    let Some(item) = state.content_repository.find_by_id(kind, &id).await? else {
        return Err(DomainError::NotFound {
            entity_type: kind.entity_type(),
            id:          id.to_string(),
        }
        .into());
    };

    Ok((kind, item))
}

/// ステータスを保存し、公開一覧のキャッシュを無効化する
async fn save_and_invalidate(
    state: &ContentState,
    kind: ContentKind,
    item: &ContentItem,
    action: &'static str,
) -> Result<(), ApiError> {
    state.content_repository.save_status(item).await?;

    let invalidated = state
        .response_cache
        .invalidate(&format!("/api/{kind}"))
        .await?;

    log_business_event!(
        event.category = event::category::CONTENT,
        event.action = action,
        event.result = event::result::SUCCESS,
        event.entity_type = content_entity_type(kind),
        event.entity_id = %item.id(),
        cache_invalidated = invalidated,
    );

    Ok(())
}

fn content_entity_type(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Posts => event::entity_type::POST,
        ContentKind::Courses => event::entity_type::COURSE,
        ContentKind::Instructors => event::entity_type::INSTRUCTOR,
        ContentKind::Banners => event::entity_type::BANNER,
    }
}
