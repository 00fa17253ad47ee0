/// 株価取り込みハンドラー
///
/// HTTPトリガーのイベントを受け取り、解析 → 検証 → 保存 → レスポンス生成を行う。
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::request_parser::{ParseError, RequestParser};
use crate::domain::ApiResponse;
use crate::infrastructure::{RepositoryError, StockPriceRepository, record_status_code};

/// 取り込みハンドラーのエラー型
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ImportHandlerError {
    /// リクエストの解析・検証に失敗（400として返す）
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// 保存に失敗（プラットフォームにそのまま伝播する）
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// 株価取り込みリクエストを処理するハンドラー
pub struct ImportHandler<R>
where
    R: StockPriceRepository,
{
    /// 株価リポジトリ
    repository: R,
}

impl<R> ImportHandler<R>
where
    R: StockPriceRepository,
{
    /// 新しいImportHandlerを作成
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// イベントを解析して保存し、保存件数を返す
    ///
    /// # 処理フロー
    /// 1. イベントからボディを取り出す
    /// 2. ボディを株価レコードの列として解析・検証
    /// 3. リポジトリに全件保存
    pub async fn import(&self, event: &Value) -> Result<usize, ImportHandlerError> {
        let body = RequestParser::extract_body(event)?;

        info!(body = %body, "リクエストボディ受信");

        let items = RequestParser::parse_items(&body)?;
        let added = self.repository.put_all(&items).await?;

        Ok(added)
    }

    /// イベントを処理してレスポンスを返す
    ///
    /// # 戻り値
    /// * `Ok(ApiResponse)` - 成功時は200、解析・検証エラー時は400
    /// * `Err(RepositoryError)` - 保存失敗（呼び出し元でLambdaの失敗として扱う）
    pub async fn handle(&self, event: &Value) -> Result<ApiResponse, RepositoryError> {
        let response = match self.import(event).await {
            Ok(added) => ApiResponse::added(added),
            Err(ImportHandlerError::Parse(err)) => {
                let response = err.to_response();
                warn!(
                    status_code = response.status_code,
                    error = %err,
                    "{}",
                    response.body
                );
                response
            }
            Err(ImportHandlerError::Repository(err)) => return Err(err),
        };

        record_status_code(response.status_code);
        Ok(response)
    }
}
