//! # レスポンスキャッシュミドルウェア
//!
//! GET リクエストのレスポンスボディをキャッシュし、ヒット時はハンドラを
//! 実行せずに返す。
//!
//! ## キャッシュキー
//!
//! `{METHOD}:{URI}` を基本とし、認証済みユーザーのリクエストには
//! `:{user_id}` を付加してユーザー単位に分離する。
//!
//! ## 対象
//!
//! - GET のみ。それ以外のメソッドは素通しする
//! - 保存するのは 200 OK のレスポンスのみ

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use manabiya_infra::ResponseCache;

use crate::middleware::auth::AuthIdentity;

/// レスポンスキャッシュミドルウェアの状態
#[derive(Clone)]
pub struct ResponseCacheState {
    pub cache: Arc<dyn ResponseCache>,
    pub ttl:   Duration,
}

/// レスポンスキャッシュミドルウェア
pub async fn cache_response(
    State(state): State<ResponseCacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = cache_key(&request);

    match state.cache.get(&key).await {
        Ok(Some(body)) => return json_response(body),
        Ok(None) => {}
        Err(e) => {
            // キャッシュ障害でリクエストを落とさない
            tracing::warn!(
                span_trace = %e.span_trace(),
                "キャッシュ取得に失敗: {e}"
            );
        }
    }

    let response = next.run(request).await;

    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("レスポンスボディの読み取りに失敗: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if let Ok(text) = std::str::from_utf8(&bytes)
        && let Err(e) = state.cache.put(&key, text.to_string(), state.ttl).await
    {
        tracing::warn!(
            span_trace = %e.span_trace(),
            "キャッシュ保存に失敗: {e}"
        );
    }

    Response::from_parts(parts, Body::from(bytes))
}

/// リクエストからキャッシュキーを組み立てる
fn cache_key(request: &Request<Body>) -> String {
    let base = format!("{}:{}", request.method(), request.uri());

    match request.extensions().get::<AuthIdentity>() {
        Some(AuthIdentity::User { user_id, .. }) => format!("{base}:{user_id}"),
        _ => base,
    }
}

fn json_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{
        Json,
        Router,
        middleware::from_fn_with_state,
        routing::get,
    };
    use manabiya_infra::InMemoryResponseCache;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;

    /// 呼び出し回数を数えるハンドラを持つテストアプリ
    fn create_test_app(counter: Arc<AtomicUsize>, ttl: Duration) -> Router {
        let state = ResponseCacheState {
            cache: Arc::new(InMemoryResponseCache::new(16)),
            ttl,
        };

        Router::new()
            .route(
                "/api/posts",
                get(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Json(json!({ "data": [], "message": "取得しました" }))
                    }
                }),
            )
            .layer(from_fn_with_state(state, cache_response))
    }

    async fn get_posts(app: &Router) -> (StatusCode, String) {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/posts")
            .body(Body::empty())
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_二回目のgetはキャッシュから返る() {
        let counter = Arc::new(AtomicUsize::new(0));
        let sut = create_test_app(counter.clone(), Duration::from_secs(60));

        let (status1, body1) = get_posts(&sut).await;
        let (status2, body2) = get_posts(&sut).await;

        assert_eq!(status1, StatusCode::OK);
        assert_eq!(status2, StatusCode::OK);
        assert_eq!(body1, body2);
        // ハンドラは一度しか呼ばれない
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ttl経過後はハンドラが再実行される() {
        let counter = Arc::new(AtomicUsize::new(0));
        let sut = create_test_app(counter.clone(), Duration::from_millis(0));

        get_posts(&sut).await;
        get_posts(&sut).await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_getでないメソッドはキャッシュされない() {
        let counter = Arc::new(AtomicUsize::new(0));
        let state = ResponseCacheState {
            cache: Arc::new(InMemoryResponseCache::new(16)),
            ttl:   Duration::from_secs(60),
        };
        let handler_counter = counter.clone();
        let sut = Router::new()
            .route(
                "/api/posts",
                axum::routing::post(move || {
                    let counter = handler_counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Json(json!({ "data": null, "message": "作成しました" }))
                    }
                }),
            )
            .layer(from_fn_with_state(state, cache_response));

        for _ in 0..2 {
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/posts")
                .body(Body::empty())
                .unwrap();
            sut.clone().oneshot(request).await.unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_エラーレスポンスはキャッシュされない() {
        let counter = Arc::new(AtomicUsize::new(0));
        let state = ResponseCacheState {
            cache: Arc::new(InMemoryResponseCache::new(16)),
            ttl:   Duration::from_secs(60),
        };
        let handler_counter = counter.clone();
        let sut = Router::new()
            .route(
                "/api/posts",
                get(move || {
                    let counter = handler_counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        StatusCode::NOT_FOUND
                    }
                }),
            )
            .layer(from_fn_with_state(state, cache_response));

        for _ in 0..2 {
            let request = Request::builder()
                .method(Method::GET)
                .uri("/api/posts")
                .body(Body::empty())
                .unwrap();
            sut.clone().oneshot(request).await.unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_クエリ文字列が異なれば別エントリになる() {
        let counter = Arc::new(AtomicUsize::new(0));
        let sut = create_test_app(counter.clone(), Duration::from_secs(60));

        for uri in ["/api/posts", "/api/posts?page=2", "/api/posts"] {
            let request = Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            sut.clone().oneshot(request).await.unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
