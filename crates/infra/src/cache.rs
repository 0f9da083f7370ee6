//! # レスポンスキャッシュ
//!
//! 公開 API のレスポンスボディを保持するプロセス内キャッシュを提供する。
//!
//! ## 設計方針
//!
//! - **TTL 付き**: エントリごとに有効期限を持ち、期限切れは取得時に破棄する。
//! - **容量制限**: エントリ数が上限に達したら、有効期限が最も近い
//!   エントリを追い出してから挿入する。無制限にメモリを消費しない。
//! - **部分一致無効化**: 管理操作でコンテンツが変化したとき、キーの
//!   部分文字列一致で関連エントリをまとめて破棄する。

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::InfraError;

/// キャッシュ全体の統計情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// エントリ数
    pub entry_count:      usize,
    /// ボディの合計サイズ（バイト）
    pub total_size_bytes: usize,
    /// エントリごとの内訳
    pub entries:          Vec<CacheEntryStats>,
}

/// エントリ単位の統計情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntryStats {
    /// キャッシュキー
    pub key:            String,
    /// ボディのサイズ（バイト）
    pub size_bytes:     usize,
    /// 残り有効期間（秒）
    pub expires_in_secs: u64,
}

/// レスポンスキャッシュを担当するトレイト
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// キーに対応するボディを取得する
    ///
    /// 期限切れのエントリは破棄し、`None` を返す。
    async fn get(&self, key: &str) -> Result<Option<String>, InfraError>;

    /// ボディを TTL 付きで保存する
    async fn put(&self, key: &str, body: String, ttl: Duration) -> Result<(), InfraError>;

    /// キーに部分文字列を含むエントリをすべて破棄し、破棄した件数を返す
    async fn invalidate(&self, pattern: &str) -> Result<usize, InfraError>;

    /// すべてのエントリを破棄し、破棄した件数を返す
    async fn clear(&self) -> Result<usize, InfraError>;

    /// 統計情報を取得する
    async fn stats(&self) -> Result<CacheStats, InfraError>;
}

struct StoredEntry {
    body:       String,
    expires_at: Instant,
}

/// プロセス内メモリによるレスポンスキャッシュの実装
pub struct InMemoryResponseCache {
    entries:  RwLock<HashMap<String, StoredEntry>>,
    capacity: usize,
}

impl InMemoryResponseCache {
    /// 既定の容量（エントリ数）
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// 指定した容量でキャッシュを作成する
    ///
    /// 容量 0 は 1 として扱う。
    pub fn new(capacity: usize) -> Self {
        Self {
            entries:  RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// 基準時刻を指定してボディを取得する
    ///
    /// 期限切れのエントリはこの時点で破棄する。
    pub async fn lookup_at(&self, key: &str, now: Instant) -> Option<String> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if now < entry.expires_at => return Some(entry.body.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // 期限切れ。write ロックを取り直して破棄する
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key)
            && now >= entry.expires_at
        {
            entries.remove(key);
        }

        None
    }

    /// 基準時刻を指定してボディを保存する
    pub async fn put_at(&self, key: &str, body: String, ttl: Duration, now: Instant) {
        let mut entries = self.entries.write().await;

        // 容量超過時は有効期限が最も近いエントリを追い出す
        if !entries.contains_key(key) && entries.len() >= self.capacity {
            let evict_key = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(k, _)| k.clone());

            if let Some(evict_key) = evict_key {
                entries.remove(&evict_key);
            }
        }

        entries.insert(
            key.to_string(),
            StoredEntry {
                body,
                expires_at: now + ttl,
            },
        );
    }

    /// 基準時刻を指定して統計情報を取得する
    ///
    /// 期限切れのエントリは、まだ破棄されていなくても数えない。
    pub async fn stats_at(&self, now: Instant) -> CacheStats {
        let entries = self.entries.read().await;

        let mut entry_stats: Vec<CacheEntryStats> = entries
            .iter()
            .filter(|(_, entry)| now < entry.expires_at)
            .map(|(key, entry)| CacheEntryStats {
                key:             key.clone(),
                size_bytes:      entry.body.len(),
                expires_in_secs: entry.expires_at.saturating_duration_since(now).as_secs(),
            })
            .collect();

        // HashMap の列挙順は不定のためキーで安定化する
        entry_stats.sort_by(|a, b| a.key.cmp(&b.key));

        CacheStats {
            entry_count:      entry_stats.len(),
            total_size_bytes: entry_stats.iter().map(|e| e.size_bytes).sum(),
            entries:          entry_stats,
        }
    }
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn get(&self, key: &str) -> Result<Option<String>, InfraError> {
        Ok(self.lookup_at(key, Instant::now()).await)
    }

    async fn put(&self, key: &str, body: String, ttl: Duration) -> Result<(), InfraError> {
        self.put_at(key, body, ttl, Instant::now()).await;
        Ok(())
    }

    async fn invalidate(&self, pattern: &str) -> Result<usize, InfraError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.contains(pattern));
        Ok(before - entries.len())
    }

    async fn clear(&self) -> Result<usize, InfraError> {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        Ok(count)
    }

    async fn stats(&self) -> Result<CacheStats, InfraError> {
        Ok(self.stats_at(Instant::now()).await)
    }
}
