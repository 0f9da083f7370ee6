//! # パスワード検証・ハッシュ化
//!
//! Argon2id によるパスワード検証とハッシュ化を提供する。

use argon2::{
    Argon2,
    Params,
    PasswordVerifier as _,
    password_hash::{
        PasswordHash as Argon2PasswordHash,
        PasswordHasher as _,
        SaltString,
        rand_core::OsRng,
    },
};
use manabiya_domain::password::{PasswordHash, PasswordVerifyResult, PlainPassword};

use crate::InfraError;

/// ダミー検証用のハッシュ（"password123" のハッシュ値）
///
/// 存在しないユーザーへのログイン試行でも同じ計算コストを払うために使用する。
/// レスポンス時間からメールアドレスの存在有無を推測されることを防ぐ。
const DUMMY_HASH: &str = "$argon2id$v=19$m=65536,t=1,p=1$olntqw+EoVpwH4B1vUAI0A$5yCA1izLODgz8nQOInDGwbuQB/AS0sIQDwpmIilve5M";

/// パスワード検証を担当するトレイト
pub trait PasswordChecker: Send + Sync {
    /// パスワードを検証する
    ///
    /// # Errors
    ///
    /// - 不正なハッシュ形式の場合
    fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<PasswordVerifyResult, InfraError>;

    /// ダミー検証を実行する
    ///
    /// ユーザーが存在しない場合でも本物の検証と同等の時間を消費させる。
    /// 結果は常に破棄される。
    fn verify_dummy(&self, password: &PlainPassword);
}

/// パスワードハッシュ化を担当するトレイト
pub trait PasswordHasher: Send + Sync {
    /// パスワードをハッシュ化する
    ///
    /// # Errors
    ///
    /// - ハッシュ計算に失敗した場合
    fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, InfraError>;
}

/// OWASP 推奨パラメータ（RFC 9106）の Argon2id インスタンスを構築する
///
/// - Memory: 64 MB
/// - Iterations: 1
/// - Parallelism: 1
fn build_argon2() -> Argon2<'static> {
    let params = Params::new(
        65536, // memory (KB) = 64 MB
        1,     // iterations
        1,     // parallelism
        None,  // output length (default: 32)
    )
    .expect("Argon2 パラメータが不正です");

    Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
}

/// Argon2id によるパスワード検証の実装
pub struct Argon2PasswordChecker {
    argon2: Argon2<'static>,
}

impl Argon2PasswordChecker {
    pub fn new() -> Self {
        Self {
            argon2: build_argon2(),
        }
    }
}

impl Default for Argon2PasswordChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordChecker for Argon2PasswordChecker {
    fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<PasswordVerifyResult, InfraError> {
        let parsed = Argon2PasswordHash::new(hash.as_str())
            .map_err(|e| InfraError::unexpected(format!("不正なハッシュ形式: {e}")))?;

        let matched = self
            .argon2
            .verify_password(password.as_str().as_bytes(), &parsed)
            .is_ok();

        Ok(PasswordVerifyResult::from(matched))
    }

    fn verify_dummy(&self, password: &PlainPassword) {
        // DUMMY_HASH はコンパイル時定数のため parse は失敗しない
        if let Ok(parsed) = Argon2PasswordHash::new(DUMMY_HASH) {
            let _ = self
                .argon2
                .verify_password(password.as_str().as_bytes(), &parsed);
        }
    }
}

/// Argon2id によるパスワードハッシュ化の実装
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self {
            argon2: build_argon2(),
        }
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, InfraError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_str().as_bytes(), &salt)
            .map_err(|e| InfraError::unexpected(format!("ハッシュ計算失敗: {e}")))?;

        Ok(PasswordHash::new(hash.to_string()))
    }
}
