//! # リポジトリ実装
//!
//! ドメイン層のエンティティの永続化を担当するリポジトリを提供する。
//!
//! ## 設計方針
//!
//! - **依存性逆転**: トレイトを定義し、PostgreSQL 実装をインフラ層で提供
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **テスタビリティ**: トレイト経由でモック可能な設計

pub mod api_key_repository;
pub mod content_repository;
pub mod refresh_token_repository;
pub mod site_config_repository;
pub mod user_repository;

pub use api_key_repository::{ApiKeyRepository, PostgresApiKeyRepository, hash_api_key};
pub use content_repository::{ContentRepository, PostgresContentRepository};
pub use refresh_token_repository::{PostgresRefreshTokenRepository, RefreshTokenRepository};
pub use site_config_repository::{PostgresSiteConfigRepository, SiteConfigRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
