/// 株価取り込みLambda関数
///
/// HTTPトリガーのイベントボディ（株価レコードのJSON配列）を検証し、
/// DynamoDBテーブルへ書き込む。
///
/// レスポンス:
/// - 200: `{"added": <件数>}`
/// - 400: `Error parsing request <message> in <content>`
/// - 書き込み失敗・設定エラー: Lambdaの失敗として返す
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use stock_price_importer::application::ImportHandler;
use stock_price_importer::infrastructure::{
    DynamoDbConfig, DynamoDbConfigError, DynamoStockPriceRepository, init_logging, request_span,
};
use tokio::sync::OnceCell;
use tracing::{Instrument, error};

/// DynamoDB設定の静的インスタンス
///
/// Lambda warm start時にクライアントを再利用するため、
/// 初回呼び出しで構築した設定を保持する。
static DYNAMODB_CONFIG: OnceCell<DynamoDbConfig> = OnceCell::const_new();

/// DynamoDB設定を取得（初期化されていなければ初期化）
async fn get_dynamodb_config() -> Result<&'static DynamoDbConfig, DynamoDbConfigError> {
    DYNAMODB_CONFIG.get_or_try_init(DynamoDbConfig::from_env).await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // Lambda関数を初期化して実行
    let func = service_fn(handler);
    lambda_runtime::run(func).await?;
    Ok(())
}

/// Lambda関数のメインハンドラー
///
/// # 処理フロー
/// 1. 共有のDynamoDB設定を取得
/// 2. リポジトリとImportHandlerを作成
/// 3. イベントを処理してレスポンスを返却
async fn handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let (payload, context) = event.into_parts();
    let span = request_span(&context.request_id);

    async move {
        let config = get_dynamodb_config().await.map_err(|err| {
            error!(error = %err, "DynamoDB設定読み込み失敗");
            err
        })?;

        let repository = DynamoStockPriceRepository::new(
            config.client().clone(),
            config.table_name().to_string(),
            config.batch_write(),
        );
        let import_handler = ImportHandler::new(repository);

        let response = import_handler.handle(&payload).await?;

        Ok::<Value, Error>(serde_json::to_value(response)?)
    }
    .instrument(span)
    .await
}
