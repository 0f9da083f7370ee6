//! # ミドルウェア
//!
//! 認証・認可・レスポンスキャッシュのミドルウェアを提供する。
//!
//! ## 適用順序
//!
//! 認証 → レスポンスキャッシュ → 認可 → ハンドラ。
//! キャッシュはユーザースコープのキーを組み立てるため認証より内側に置く。

pub mod auth;
pub mod permission;
pub mod response_cache;

pub use auth::{AuthIdentity, AuthnState, authenticate};
pub use permission::{PermissionState, require_permission};
pub use response_cache::{ResponseCacheState, cache_response};
