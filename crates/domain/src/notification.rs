//! # 通知
//!
//! メール通知に関するドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: 通知送信の失敗はパスワード再設定フローの
//!   レスポンスに影響しない（アカウント存在の推測を防ぐ）
//! - **本文生成の分離**: メッセージの組み立てはドメイン層、
//!   SMTP 送信はインフラ層の責務

use thiserror::Error;

use crate::user::{Email, ResetCode};

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),
}

/// メールメッセージ
///
/// NotificationSender に渡される送信単位。
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:      String,
    /// 件名
    pub subject: String,
    /// プレーンテキスト本文
    pub body:    String,
}

/// パスワード再設定コードの通知メールを組み立てる
///
/// コードの有効期限（分）を本文に含める。
pub fn password_reset_email(to: &Email, code: &ResetCode, expires_minutes: i64) -> EmailMessage {
    EmailMessage {
        to:      to.as_str().to_string(),
        subject: "【学び舎】パスワード再設定コードのお知らせ".to_string(),
        body:    format!(
            "パスワード再設定のリクエストを受け付けました。\n\n\
             再設定コード: {}\n\n\
             このコードは発行から {} 分間有効です。\n\
             心当たりがない場合は、このメールを破棄してください。",
            code.as_str(),
            expires_minutes
        ),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_パスワード再設定メールに宛先とコードが含まれる() {
        let to = Email::new("user@example.com").unwrap();
        let code = ResetCode::new("123456").unwrap();

        let message = password_reset_email(&to, &code, 30);

        assert_eq!(message.to, "user@example.com");
        assert!(message.body.contains("123456"));
        assert!(message.body.contains("30 分間"));
    }
}
