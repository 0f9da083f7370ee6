//! # Manabiya ドメイン層
//!
//! ビジネスロジックの中核を担うドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! このクレートは DDD（ドメイン駆動設計）の原則に従い、以下を提供する:
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: User, RefreshToken）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: Email,
//!   EntityStatus）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! api → infra → domain → shared
//! ```
//!
//! ドメイン層はインフラ層（DB、外部サービス）には一切依存しない。
//! これにより、ビジネスロジックの純粋性が保たれる。
//!
//! ## 使用例
//!
//! ```rust
//! use manabiya_domain::{DomainError, user::UserId};
//!
//! // ユーザー ID の生成
//! let user_id = UserId::new();
//!
//! // ドメインエラーの生成
//! let error = DomainError::NotFound {
//!     entity_type: "User",
//!     id:          "u-123".to_string(),
//! };
//! ```

pub mod api_key;
pub mod content;
pub mod error;
pub mod notification;
pub mod password;
pub mod role;
pub mod site_config;
pub mod status;
pub mod token;
pub mod user;

pub use error::DomainError;
