//! # オブジェクトストレージ
//!
//! Amazon S3 / MinIO 上のアップロード済みファイルの一覧取得と削除を行う。
//!
//! ## 設計方針
//!
//! - **ローカル開発**: MinIO を使用（`S3_ENDPOINT_URL` で接続先を指定）
//! - **本番環境**: IAM ロールによる認証で Amazon S3 に接続（`S3_ENDPOINT_URL` 未設定）
//! - **読み取りと削除のみ**: ファイルのアップロードは CDN 側の
//!   ワークフローで行うため、このサーバーは一覧と削除だけを提供する。

use async_trait::async_trait;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::InfraError;

/// ストレージ上のオブジェクト情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    /// オブジェクトキー
    pub key:           String,
    /// サイズ（バイト）
    pub size:          i64,
    /// 最終更新日時
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// ファイルストレージのインターフェース
///
/// オブジェクトの一覧取得と削除を提供する。
/// テスト時はモックに差し替え可能。
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// オブジェクトの一覧を取得する
    ///
    /// # 引数
    ///
    /// * `prefix` - キーのプレフィックスで絞り込む（例: `images/`）。
    ///   `None` の場合はバケット全体を列挙する。
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<StoredObject>, InfraError>;

    /// オブジェクトを削除する
    ///
    /// S3 の仕様上、存在しないキーの削除も成功する。
    async fn delete(&self, key: &str) -> Result<(), InfraError>;
}

/// AWS S3 によるファイルストレージの実装
///
/// `aws-sdk-s3` を使用した [`FileStorage`] の実装。
/// MinIO とも互換動作する。
pub struct AwsFileStorage {
    client:      Client,
    bucket_name: String,
}

impl AwsFileStorage {
    /// 新しいファイルストレージを作成する
    pub fn new(client: Client, bucket_name: String) -> Self {
        Self {
            client,
            bucket_name,
        }
    }
}

#[async_trait]
impl FileStorage for AwsFileStorage {
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<StoredObject>, InfraError> {
        let mut request = self.client.list_objects_v2().bucket(&self.bucket_name);

        if let Some(prefix) = prefix {
            request = request.prefix(prefix);
        }

        let mut objects = Vec::new();
        let mut paginator = request.into_paginator().send();

        while let Some(page) = paginator.next().await {
            let page =
                page.map_err(|e| InfraError::s3(format!("オブジェクト一覧の取得に失敗: {e}")))?;

            for object in page.contents() {
                let Some(key) = object.key() else {
                    continue;
                };

                objects.push(StoredObject {
                    key:           key.to_string(),
                    size:          object.size().unwrap_or(0),
                    last_modified: object
                        .last_modified()
                        .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())),
                });
            }
        }

        Ok(objects)
    }

    async fn delete(&self, key: &str) -> Result<(), InfraError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| InfraError::s3(format!("オブジェクトの削除に失敗: {e}")))?;

        Ok(())
    }
}

/// S3 クライアントを作成する
///
/// `endpoint` が `Some` の場合は MinIO 等のカスタムエンドポイントに接続する。
/// `None` の場合は AWS S3 のデフォルトエンドポイントを使用する。
///
/// 認証情報は SDK のデフォルト認証チェーンで解決する:
/// - ローカル: 環境変数 `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`（`.env` で設定）
/// - 本番: IAM ロール
pub async fn create_client(endpoint: Option<&str>) -> Client {
    let mut config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new("ap-northeast-1"));

    if let Some(endpoint_url) = endpoint {
        config_builder = config_builder.endpoint_url(endpoint_url);
    }

    let config = config_builder.load().await;

    // MinIO はパススタイルが必要（バーチャルホスト型 URL を使わない）
    // エンドポイント指定時のみ force_path_style を有効化
    let s3_config_builder = aws_sdk_s3::config::Builder::from(&config);
    let s3_config = if endpoint.is_some() {
        s3_config_builder.force_path_style(true).build()
    } else {
        s3_config_builder.build()
    };

    Client::from_conf(s3_config)
}
