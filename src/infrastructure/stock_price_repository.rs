/// 株価レコードをDynamoDBに保存するためのリポジトリ
///
/// BatchWriteItemで25件ずつ書き込み、未処理アイテムは指数バックオフで再送する。
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::config::BatchWriteConfig;
use crate::domain::StockPriceItem;

/// BatchWriteItemは1回最大25件まで
pub const BATCH_WRITE_LIMIT: usize = 25;

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// DynamoDBへの書き込みに失敗
    #[error("Write error: {0}")]
    WriteError(String),

    /// アイテムのAttributeValue変換に失敗
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 最大試行回数を超えても未処理アイテムが残った
    #[error("Unprocessed items remain after {attempts} attempts: {remaining} items")]
    UnprocessedItems { attempts: u32, remaining: usize },
}

/// 株価レコード永続化用トレイト
///
/// 実際のDynamoDB実装とテスト用モックを差し替えられるようにする。
#[async_trait]
pub trait StockPriceRepository: Send + Sync {
    /// 株価レコードをすべて保存
    ///
    /// # 戻り値
    /// * 成功時は`Ok(件数)`（投入した件数。個別の確認応答から数えたものではない）
    /// * 失敗時は`Err(RepositoryError)`。失敗前に一部が書き込まれている可能性がある
    async fn put_all(&self, items: &[StockPriceItem]) -> Result<usize, RepositoryError>;
}

/// BatchWriteItem 1回分の呼び出し
///
/// 戻り値は未処理として返されたWriteRequest（全件処理済みなら空）。
#[async_trait]
pub trait BatchWriteClient: Send + Sync {
    async fn batch_write(
        &self,
        table_name: &str,
        requests: Vec<WriteRequest>,
    ) -> Result<Vec<WriteRequest>, RepositoryError>;
}

#[async_trait]
impl BatchWriteClient for DynamoDbClient {
    async fn batch_write(
        &self,
        table_name: &str,
        requests: Vec<WriteRequest>,
    ) -> Result<Vec<WriteRequest>, RepositoryError> {
        let output = self
            .batch_write_item()
            .request_items(table_name, requests)
            .send()
            .await
            .map_err(|e| RepositoryError::WriteError(e.to_string()))?;

        Ok(output
            .unprocessed_items
            .and_then(|mut items| items.remove(table_name))
            .unwrap_or_default())
    }
}

/// StockPriceRepositoryのDynamoDB実装
///
/// キーはテーブル側のキースキーマに従う。レコードの属性をそのまま
/// AttributeValueに変換して書き込む。
#[derive(Debug, Clone)]
pub struct DynamoStockPriceRepository<C = DynamoDbClient> {
    /// BatchWriteItemの呼び出し先（通常はDynamoDBクライアント）
    client: C,
    /// 株価テーブル名
    table_name: String,
    /// 未処理アイテム再送の設定
    config: BatchWriteConfig,
}

impl<C> DynamoStockPriceRepository<C>
where
    C: BatchWriteClient,
{
    /// 新しいDynamoStockPriceRepositoryを作成
    ///
    /// # 引数
    /// * `client` - DynamoDBクライアント
    /// * `table_name` - 株価テーブルの名前
    /// * `config` - バッチ書き込み設定
    pub fn new(client: C, table_name: String, config: BatchWriteConfig) -> Self {
        Self {
            client,
            table_name,
            config,
        }
    }

    /// 株価レコードをPutRequestに変換
    ///
    /// 数値はN、文字列はS、配列はL、オブジェクトはM、真偽値はBOOL、nullはNULLになる。
    fn to_write_request(item: &StockPriceItem) -> Result<WriteRequest, RepositoryError> {
        let attributes: HashMap<String, AttributeValue> = serde_dynamo::to_item(item)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        let put_request = PutRequest::builder()
            .set_item(Some(attributes))
            .build()
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        Ok(WriteRequest::builder().put_request(put_request).build())
    }

    /// 1チャンク（最大25件）を書き込む
    ///
    /// 未処理アイテムが返された場合は待機してから残りだけを再送する。
    /// 試行回数は最初の送信を含めて`max_attempts`回まで。
    async fn write_chunk(&self, chunk: Vec<WriteRequest>) -> Result<(), RepositoryError> {
        let mut pending = chunk;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let unprocessed = self.client.batch_write(&self.table_name, pending).await?;

            if unprocessed.is_empty() {
                return Ok(());
            }

            if attempt >= self.config.max_attempts() {
                return Err(RepositoryError::UnprocessedItems {
                    attempts: attempt,
                    remaining: unprocessed.len(),
                });
            }

            let delay = self.config.backoff_delay(attempt);
            warn!(
                table_name = %self.table_name,
                attempt = attempt,
                unprocessed_count = unprocessed.len(),
                delay_ms = delay.as_millis() as u64,
                "未処理アイテムを再送"
            );
            tokio::time::sleep(delay).await;

            pending = unprocessed;
        }
    }

    /// 全レコードをチャンクに分けて書き込む
    ///
    /// `written`には完全に書き込みが確認できたチャンクの件数を積算する。
    async fn write_chunks(
        &self,
        items: &[StockPriceItem],
        written: &mut usize,
    ) -> Result<(), RepositoryError> {
        let requests = items
            .iter()
            .map(Self::to_write_request)
            .collect::<Result<Vec<_>, _>>()?;

        for (index, chunk) in requests.chunks(BATCH_WRITE_LIMIT).enumerate() {
            debug!(
                table_name = %self.table_name,
                chunk_index = index,
                chunk_size = chunk.len(),
                "チャンク書き込み"
            );
            self.write_chunk(chunk.to_vec()).await?;
            *written += chunk.len();
        }

        Ok(())
    }
}

#[async_trait]
impl<C> StockPriceRepository for DynamoStockPriceRepository<C>
where
    C: BatchWriteClient,
{
    async fn put_all(&self, items: &[StockPriceItem]) -> Result<usize, RepositoryError> {
        let total = items.len();
        let mut written = 0usize;

        match self.write_chunks(items, &mut written).await {
            Ok(()) => {
                info!(
                    table_name = %self.table_name,
                    written = total,
                    "Success"
                );
                Ok(total)
            }
            Err(err) => {
                error!(
                    table_name = %self.table_name,
                    written = written,
                    total = total,
                    error = %err,
                    "Wrote {} of {}",
                    written,
                    total
                );
                Err(err)
            }
        }
    }
}
