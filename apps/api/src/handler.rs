//! # HTTP ハンドラ
//!
//! ルートごとのリクエスト処理を提供する。
//!
//! ## 構成
//!
//! | モジュール | 担当ルート |
//! |-----------|-----------|
//! | [`health`] | `/health` |
//! | [`auth`] | `/api/auth/*` |
//! | [`content`] | `/api/{posts,courses,banners}`、`/api/admin/content/*` |
//! | [`users`] | `/api/admin/users/*` |
//! | [`site_config`] | `/api/config`、`/api/admin/config` |
//! | [`storage`] | `/api/admin/storage/*` |
//! | [`cache_admin`] | `/api/admin/cache` |

pub mod auth;
pub mod cache_admin;
pub mod content;
pub mod health;
pub mod site_config;
pub mod storage;
pub mod users;
