//! # Manabiya インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはドメイン層のモデルを永続化・転送するための具体的な
//! 実装を提供する。外部システムの詳細をカプセル化し、ドメイン層を
//! インフラの変更から保護する。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理
//! - **リポジトリ実装**: ユーザー・リフレッシュトークン・コンテンツ等の永続化
//! - **トークン発行**: JWT アクセストークンの発行と検証
//! - **レスポンスキャッシュ**: プロセス内 TTL 付きキャッシュ
//! - **オブジェクトストレージ**: S3 互換ストレージのファイル一覧・削除
//! - **メール送信**: SMTP によるパスワード再設定コードの送付
//!
//! ## 依存関係
//!
//! ```text
//! api → infra → domain → shared
//! ```
//!
//! ドメイン層はインフラ層に依存しない（依存性逆転の原則）。

pub mod cache;
pub mod db;
pub mod error;
pub mod notification;
pub mod password;
pub mod repository;
pub mod s3;
pub mod token;

pub use cache::{CacheStats, InMemoryResponseCache, ResponseCache};
pub use error::InfraError;
pub use password::{
    Argon2PasswordChecker,
    Argon2PasswordHasher,
    PasswordChecker,
    PasswordHasher,
};
pub use s3::{AwsFileStorage, FileStorage, StoredObject};
pub use token::{
    AccessTokenClaims,
    JwtTokenIssuer,
    TokenError,
    TokenIssuer,
    generate_opaque_token,
    generate_reset_code,
};
