//! # インフラ層エラー定義
//!
//! データベースや外部サービスとの通信で発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **エラーの変換**: sqlx::Error, serde_json::Error などをラップ
//! - **ドメインエラーとの分離**: インフラ固有のエラーを明示
//! - **ログ可能性**: Debug によりログ出力時に詳細情報を表示
//! - **SpanTrace 自動捕捉**: `From` 実装や convenience constructor で
//!   エラー生成時の呼び出し経路を自動記録する
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（Database, S3, Email 等）

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別（[`InfraErrorKind`]）と [`SpanTrace`]（呼び出し経路）を保持する。
/// `From<sqlx::Error>` 等の変換や convenience constructor でエラーを生成すると、
/// その時点のスパン情報が自動的にキャプチャされる。
///
/// ## パターンマッチ
///
/// エラー種別に応じた処理には [`kind()`](InfraError::kind) を使用する:
///
/// ```ignore
/// match error.kind() {
///     InfraErrorKind::Database(_) => { /* DB 障害処理 */ }
///     _ => { /* その他 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
///
/// データベースクエリ、S3 操作、メール送信などで発生するエラーの具体的な種別。
/// API 層でこのエラー種別に応じて適切な HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// データベースエラー
    ///
    /// SQL クエリの実行失敗、接続エラー、制約違反など。
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// シリアライズ/デシリアライズエラー
    ///
    /// JSON の変換に失敗した場合に使用する。
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// S3 エラー
    ///
    /// S3 への操作で発生するエラー。
    /// AWS SDK のエラー型はジェネリクスが深く `#[from]` が困難なため、
    /// 手動で String にマップする。
    #[error("S3 エラー: {0}")]
    S3(String),

    /// メール送信エラー
    ///
    /// SMTP サーバーへの接続失敗、送信失敗など。
    #[error("メール送信エラー: {0}")]
    Email(String),

    /// クライアント入力エラー
    ///
    /// クライアントからの入力が不正な場合に使用する。
    /// インフラ層で検出されるが、原因はクライアント入力にある。
    #[error("入力エラー: {0}")]
    InvalidInput(String),

    /// 予期しないエラー
    ///
    /// 上記に分類できない予期しないエラー。
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

// ===== InfraError のメソッド =====

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// InfraError を分解して InfraErrorKind と SpanTrace を取り出す
    pub fn into_parts(self) -> (InfraErrorKind, SpanTrace) {
        (self.kind, self.span_trace)
    }

    /// InfraErrorKind と SpanTrace から InfraError を組み立てる
    pub fn from_parts(kind: InfraErrorKind, span_trace: SpanTrace) -> Self {
        Self { kind, span_trace }
    }

    // ===== Convenience constructors =====

    /// S3 エラーを生成する
    pub fn s3(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::S3(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }

    /// メール送信エラーを生成する
    pub fn email(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::Email(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }

    /// クライアント入力エラーを生成する
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::InvalidInput(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::Unexpected(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        Self {
            kind:       InfraErrorKind::Database(source),
            span_trace: SpanTrace::capture(),
        }
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(source: serde_json::Error) -> Self {
        Self {
            kind:       InfraErrorKind::Serialization(source),
            span_trace: SpanTrace::capture(),
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::layer::SubscriberExt as _;

    use super::*;

    /// テスト用に ErrorLayer 付き subscriber を設定する
    fn with_error_layer(f: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(tracing_error::ErrorLayer::default());
        let _guard = tracing::subscriber::set_default(subscriber);
        f();
    }

    // ===== From 実装のテスト =====

    #[test]
    fn test_from_sqlx_errorでspan_traceがキャプチャされる() {
        with_error_layer(|| {
            let span = tracing::info_span!("test_repo", user_id = "u-001");
            let _enter = span.enter();

            let sqlx_err = sqlx::Error::RowNotFound;
            let err: InfraError = sqlx_err.into();

            assert!(matches!(err.kind(), InfraErrorKind::Database(_)));
            let trace_str = format!("{}", err.span_trace());
            assert!(
                trace_str.contains("test_repo"),
                "SpanTrace がスパン名を含むこと: {trace_str}",
            );
        });
    }

    #[test]
    fn test_from_serde_json_errorでspan_traceがキャプチャされる() {
        with_error_layer(|| {
            let span = tracing::info_span!("test_serialization");
            let _enter = span.enter();

            let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
            let err: InfraError = json_err.into();

            assert!(matches!(err.kind(), InfraErrorKind::Serialization(_)));
            let trace_str = format!("{}", err.span_trace());
            assert!(
                trace_str.contains("test_serialization"),
                "SpanTrace がスパン名を含むこと: {trace_str}",
            );
        });
    }

    // ===== Convenience constructor のテスト =====

    #[test]
    fn test_s3でspan_traceがキャプチャされる() {
        with_error_layer(|| {
            let span = tracing::info_span!("test_s3");
            let _enter = span.enter();

            let err = InfraError::s3("一覧取得失敗");

            assert!(matches!(err.kind(), InfraErrorKind::S3(msg) if msg == "一覧取得失敗"));
            let trace_str = format!("{}", err.span_trace());
            assert!(trace_str.contains("test_s3"));
        });
    }

    #[test]
    fn test_emailでメール送信エラーを生成できる() {
        with_error_layer(|| {
            let err = InfraError::email("SMTP 接続失敗");
            assert!(matches!(err.kind(), InfraErrorKind::Email(msg) if msg == "SMTP 接続失敗"));
        });
    }

    #[test]
    fn test_invalid_inputで入力エラーを生成できる() {
        with_error_layer(|| {
            let err = InfraError::invalid_input("不正な入力");
            assert!(matches!(
                err.kind(),
                InfraErrorKind::InvalidInput(msg) if msg == "不正な入力"
            ));
        });
    }

    #[test]
    fn test_unexpectedで予期しないエラーを生成できる() {
        with_error_layer(|| {
            let err = InfraError::unexpected("予期しないエラー");
            assert!(matches!(
                err.kind(),
                InfraErrorKind::Unexpected(msg) if msg == "予期しないエラー"
            ));
        });
    }

    // ===== Display / source のテスト =====

    #[test]
    fn test_displayがinfra_error_kindのメッセージを出力する() {
        let err = InfraError::s3("バケットが見つかりません");
        assert_eq!(format!("{err}"), "S3 エラー: バケットが見つかりません");
    }

    #[test]
    fn test_sourceがinfra_error_kindに委譲する() {
        use std::error::Error;

        let sqlx_err = sqlx::Error::RowNotFound;
        let err: InfraError = sqlx_err.into();

        // Database variant は sqlx::Error を source として持つ
        assert!(err.source().is_some());
    }
}
