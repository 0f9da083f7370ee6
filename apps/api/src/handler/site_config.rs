//! # サイト設定ハンドラ
//!
//! サイト全体のキー/バリュー設定の公開取得と管理更新を提供する。

use std::{collections::BTreeMap, sync::Arc};

use axum::{Json, extract::State};
use chrono::Utc;
use manabiya_domain::site_config::SiteConfigEntry;
use manabiya_infra::{ResponseCache, repository::SiteConfigRepository};
use manabiya_shared::ApiResponse;
use serde::Deserialize;

use crate::error::ApiError;

/// サイト設定ハンドラ群の状態
#[derive(Clone)]
pub struct SiteConfigState {
    pub site_config_repository: Arc<dyn SiteConfigRepository>,
    pub response_cache:         Arc<dyn ResponseCache>,
}

/// 設定更新リクエスト
///
/// 含まれるキーのみ更新する（マージ。全置換ではない）。
#[derive(Debug, Deserialize)]
pub struct UpdateConfigRequest {
    pub values: BTreeMap<String, String>,
}

/// `GET /api/config`
///
/// 公開向けの設定マップ `{ key: value }` を返す。
pub async fn get_public_config(
    State(state): State<SiteConfigState>,
) -> Result<Json<ApiResponse<BTreeMap<String, String>>>, ApiError> {
    let entries = state.site_config_repository.find_all().await?;

    let values: BTreeMap<String, String> = entries
        .into_iter()
        .map(|entry| (entry.key, entry.value))
        .collect();

    Ok(Json(ApiResponse::ok(values)))
}

/// `GET /api/admin/config`
///
/// 更新日時付きの全エントリを返す。
pub async fn get_admin_config(
    State(state): State<SiteConfigState>,
) -> Result<Json<ApiResponse<Vec<SiteConfigEntry>>>, ApiError> {
    let entries = state.site_config_repository.find_all().await?;

    Ok(Json(ApiResponse::ok(entries)))
}

/// `PUT /api/admin/config`
///
/// 指定されたキーを upsert し、公開設定のキャッシュを無効化する。
pub async fn update_config(
    State(state): State<SiteConfigState>,
    Json(request): Json<UpdateConfigRequest>,
) -> Result<Json<ApiResponse<Vec<SiteConfigEntry>>>, ApiError> {
    let now = Utc::now();

    for (key, value) in request.values {
        let entry = SiteConfigEntry::new(key, value, now)?;
        state.site_config_repository.upsert(&entry).await?;
    }

    state.response_cache.invalidate("/api/config").await?;

    let entries = state.site_config_repository.find_all().await?;

    Ok(Json(ApiResponse::new(entries, "設定を更新しました")))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode, header},
        routing::{get, put},
    };
    use chrono::{DateTime, Utc};
    use manabiya_infra::{InMemoryResponseCache, InfraError};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;

    /// サイト設定リポジトリのインメモリ実装
    #[derive(Default)]
    struct InMemorySiteConfigRepository {
        entries: Mutex<BTreeMap<String, SiteConfigEntry>>,
    }

    impl InMemorySiteConfigRepository {
        fn with_entries(entries: Vec<SiteConfigEntry>) -> Self {
            Self {
                entries: Mutex::new(
                    entries.into_iter().map(|e| (e.key.clone(), e)).collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl SiteConfigRepository for InMemorySiteConfigRepository {
        async fn find_all(&self) -> Result<Vec<SiteConfigEntry>, InfraError> {
            Ok(self.entries.lock().unwrap().values().cloned().collect())
        }

        async fn upsert(&self, entry: &SiteConfigEntry) -> Result<(), InfraError> {
            self.entries
                .lock()
                .unwrap()
                .insert(entry.key.clone(), entry.clone());
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    struct TestConfigApp {
        cache: Arc<InMemoryResponseCache>,
        app:   Router,
    }

    fn create_test_app(entries: Vec<SiteConfigEntry>) -> TestConfigApp {
        let cache = Arc::new(InMemoryResponseCache::new(16));
        let state = SiteConfigState {
            site_config_repository: Arc::new(InMemorySiteConfigRepository::with_entries(
                entries,
            )),
            response_cache:         cache.clone(),
        };

        let app = Router::new()
            .route("/api/config", get(get_public_config))
            .route(
                "/api/admin/config",
                get(get_admin_config).put(update_config),
            )
            .with_state(state);

        TestConfigApp { cache, app }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_公開設定はキーバリューのマップで返る() {
        let sut = create_test_app(vec![
            SiteConfigEntry::new("site_title", "学び舎", now()).unwrap(),
            SiteConfigEntry::new("contact_email", "info@example.com", now()).unwrap(),
        ]);

        let response = sut
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/config")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["data"]["site_title"], "学び舎");
        assert_eq!(json["data"]["contact_email"], "info@example.com");
    }

    #[tokio::test]
    async fn test_更新はマージで行われキャッシュが無効化される() {
        let sut = create_test_app(vec![
            SiteConfigEntry::new("site_title", "学び舎", now()).unwrap(),
            SiteConfigEntry::new("contact_email", "info@example.com", now()).unwrap(),
        ]);

        sut.cache
            .put(
                "GET:/api/config",
                "{}".to_string(),
                std::time::Duration::from_secs(60),
            )
            .await
            .unwrap();

        let request = Request::builder()
            .method(Method::PUT)
            .uri("/api/admin/config")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "values": { "site_title": "新しい学び舎" } })
                    .to_string(),
            ))
            .unwrap();

        let response = sut.app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sut.cache.get("GET:/api/config").await.unwrap(), None);

        // 更新したキーだけが変わり、他のキーは残る
        let json = body_json(
            sut.app
                .oneshot(
                    Request::builder()
                        .uri("/api/config")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(json["data"]["site_title"], "新しい学び舎");
        assert_eq!(json["data"]["contact_email"], "info@example.com");
    }

    #[tokio::test]
    async fn test_空のキーは400() {
        let sut = create_test_app(vec![]);

        let request = Request::builder()
            .method(Method::PUT)
            .uri("/api/admin/config")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "values": { "": "値" } }).to_string(),
            ))
            .unwrap();

        let response = sut.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_管理設定は更新日時を含む() {
        let sut = create_test_app(vec![
            SiteConfigEntry::new("site_title", "学び舎", now()).unwrap(),
        ]);

        let response = sut
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/admin/config")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["data"][0]["key"], "site_title");
        assert!(json["data"][0].get("updated_at").is_some());
    }
}
