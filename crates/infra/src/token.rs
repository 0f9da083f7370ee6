//! # トークン発行・検証
//!
//! JWT アクセストークンの発行・検証と、不透明トークンの生成を提供する。
//!
//! ## 設計方針
//!
//! - **アクセストークン**: HS256 署名の JWT。短命（既定 15 分）で
//!   ステートレスに検証できる。
//! - **リフレッシュトークン**: 64 文字の英数字からなる不透明トークン。
//!   データベースで失効管理する。
//! - **leeway なし**: 有効期限の検証に時計のずれの猶予を与えない。
//!   期限を 1 秒でも過ぎたトークンは拒否する。

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm,
    DecodingKey,
    EncodingKey,
    Header,
    Validation,
    errors::ErrorKind,
};
use manabiya_domain::{
    role::Role,
    user::{Email, UserId},
};
use rand::{Rng as _, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::InfraError;

/// トークン検証エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// 有効期限切れ
    #[error("トークンの有効期限が切れています")]
    Expired,
    /// 署名不正・形式不正など
    #[error("トークンが不正です")]
    Invalid,
}

/// アクセストークンのクレーム
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// ユーザー ID（UUID 文字列）
    pub sub:   String,
    /// メールアドレス
    pub email: String,
    /// ロール
    pub role:  Role,
    /// 発行日時（UNIX 秒）
    pub iat:   i64,
    /// 有効期限（UNIX 秒）
    pub exp:   i64,
}

impl AccessTokenClaims {
    /// sub クレームをユーザー ID に変換する
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        let uuid = Uuid::parse_str(&self.sub).map_err(|_| TokenError::Invalid)?;
        Ok(UserId::from_uuid(uuid))
    }
}

/// アクセストークンの発行・検証を担当するトレイト
pub trait TokenIssuer: Send + Sync {
    /// アクセストークンを発行する
    fn issue(
        &self,
        user_id: &UserId,
        email: &Email,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, InfraError>;

    /// アクセストークンを検証し、クレームを取り出す
    fn verify(&self, token: &str) -> Result<AccessTokenClaims, TokenError>;
}

/// HS256 署名による JWT 発行・検証の実装
pub struct JwtTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl:          Duration,
    validation:   Validation,
}

impl JwtTokenIssuer {
    /// 共有シークレットとトークン有効期間から発行器を作成する
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 期限切れトークンを 1 秒たりとも許容しない
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            validation,
        }
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(
        &self,
        user_id: &UserId,
        email: &Email,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, InfraError> {
        let claims = AccessTokenClaims {
            sub:   user_id.to_string(),
            email: email.as_str().to_string(),
            role,
            iat:   now.timestamp(),
            exp:   (now + self.ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| InfraError::unexpected(format!("JWT 発行失敗: {e}")))
    }

    fn verify(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

/// 不透明トークン（リフレッシュトークン用）を生成する
///
/// 64 文字の英数字。衝突の可能性は実用上無視できる。
pub fn generate_opaque_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// パスワード再設定コードを生成する
///
/// ゼロ埋めした 6 桁の数字文字列。
pub fn generate_reset_code() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn issuer() -> JwtTokenIssuer {
        JwtTokenIssuer::new("test-secret", Duration::minutes(15))
    }

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[fixture]
    fn email() -> Email {
        Email::new("yamada@example.com").unwrap()
    }

    #[rstest]
    fn test_発行したトークンを検証できる(
        issuer: JwtTokenIssuer,
        now: DateTime<Utc>,
        email: Email,
    ) {
        let user_id = UserId::new();
        let token = issuer.issue(&user_id, &email, Role::Admin, now).unwrap();

        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "yamada@example.com");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[rstest]
    fn test_期限切れトークンはexpiredエラー(now: DateTime<Utc>, email: Email) {
        // 有効期間を負にして発行時点で期限切れにする
        let issuer = JwtTokenIssuer::new("test-secret", Duration::minutes(-1));
        let token = issuer
            .issue(&UserId::new(), &email, Role::Student, now)
            .unwrap();

        assert_eq!(issuer.verify(&token), Err(TokenError::Expired));
    }

    #[rstest]
    fn test_異なるシークレットで署名されたトークンは拒否される(
        issuer: JwtTokenIssuer,
        now: DateTime<Utc>,
        email: Email,
    ) {
        let other = JwtTokenIssuer::new("other-secret", Duration::minutes(15));
        let token = other
            .issue(&UserId::new(), &email, Role::Admin, now)
            .unwrap();

        assert_eq!(issuer.verify(&token), Err(TokenError::Invalid));
    }

    #[rstest]
    #[case("")]
    #[case("not-a-jwt")]
    #[case("aaa.bbb.ccc")]
    fn test_形式不正なトークンはinvalidエラー(issuer: JwtTokenIssuer, #[case] token: &str) {
        assert_eq!(issuer.verify(token), Err(TokenError::Invalid));
    }

    #[rstest]
    fn test_不透明トークンは64文字の英数字() {
        let token = generate_opaque_token();

        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[rstest]
    fn test_不透明トークンは毎回異なる() {
        assert_ne!(generate_opaque_token(), generate_opaque_token());
    }

    #[rstest]
    fn test_再設定コードは6桁の数字() {
        for _ in 0..100 {
            let code = generate_reset_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
