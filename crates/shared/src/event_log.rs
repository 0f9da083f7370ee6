//! # ビジネスイベントログの構造化ヘルパー
//!
//! ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID
/// - `event.actor_id`: 操作者 ID
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const AUTH: &str = "auth";
        pub const CONTENT: &str = "content";
        pub const NOTIFICATION: &str = "notification";
        pub const STORAGE: &str = "storage";
        pub const USER: &str = "user";
    }

    /// イベントアクション
    pub mod action {
        // 認証
        pub const LOGIN_SUCCESS: &str = "auth.login_success";
        pub const LOGIN_FAILURE: &str = "auth.login_failure";
        pub const LOGOUT: &str = "auth.logout";
        pub const TOKEN_REFRESHED: &str = "auth.token_refreshed";
        pub const PASSWORD_RESET_REQUESTED: &str = "auth.password_reset_requested";
        pub const PASSWORD_CHANGED: &str = "auth.password_changed";

        // コンテンツ管理
        pub const CONTENT_ACTIVATED: &str = "content.activated";
        pub const CONTENT_ARCHIVED: &str = "content.archived";
        pub const CONTENT_RESTORED: &str = "content.restored";

        // ユーザー管理
        pub const USER_ARCHIVED: &str = "user.archived";
        pub const USER_RESTORED: &str = "user.restored";

        // 通知
        pub const NOTIFICATION_SENT: &str = "notification.sent";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";

        // ストレージ
        pub const FILE_DELETED: &str = "storage.file_deleted";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const USER: &str = "user";
        pub const REFRESH_TOKEN: &str = "refresh_token";
        pub const POST: &str = "post";
        pub const COURSE: &str = "course";
        pub const INSTRUCTOR: &str = "instructor";
        pub const BANNER: &str = "banner";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（DB、キャッシュ、S3、SMTP）
        pub const INFRASTRUCTURE: &str = "infrastructure";
    }

    /// エラー種別
    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const TOKEN: &str = "token";
        pub const INTERNAL: &str = "internal";
        pub const USER_LOOKUP: &str = "user_lookup";
        pub const PASSWORD_VERIFICATION: &str = "password_verification";
        pub const STORAGE: &str = "storage";
        pub const EMAIL: &str = "email";
    }
}
