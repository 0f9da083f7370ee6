//! # サイト設定
//!
//! サイト全体の設定値（キー/バリュー形式）を定義する。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// サイト設定エントリ
///
/// `site_config` テーブルの 1 行。キーはサイト内で一意。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfigEntry {
    pub key:        String,
    pub value:      String,
    pub updated_at: DateTime<Utc>,
}

impl SiteConfigEntry {
    /// 新しい設定エントリを作成する
    ///
    /// # バリデーション
    ///
    /// - キーは空文字列ではない
    /// - キーは最大 100 文字
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let key = key.into();

        if key.is_empty() {
            return Err(DomainError::Validation(
                "設定キーは必須です".to_string(),
            ));
        }

        if key.len() > 100 {
            return Err(DomainError::Validation(
                "設定キーは100文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self {
            key,
            value: value.into(),
            updated_at: now,
        })
    }
}
