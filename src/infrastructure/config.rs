/// DynamoDB接続設定とバッチ書き込み設定
use std::time::Duration;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use thiserror::Error;

/// テーブル名の環境変数
pub const TABLE_NAME_ENV: &str = "STOCK_PRICES_TABLE";

/// テーブル名のデフォルト値
pub const DEFAULT_TABLE_NAME: &str = "demo_stock_prices";

/// 最大試行回数の環境変数
pub const MAX_ATTEMPTS_ENV: &str = "BATCH_WRITE_MAX_ATTEMPTS";

/// バックオフ初期待機時間（ミリ秒）の環境変数
pub const BASE_DELAY_MS_ENV: &str = "BATCH_WRITE_BASE_DELAY_MS";

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_BASE_DELAY_MS: u64 = 50;

/// 待機時間の倍率上限（2^10倍）
const MAX_BACKOFF_SHIFT: u32 = 10;

/// バッチ書き込み設定のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BatchWriteConfigError {
    /// 最大試行回数が不正（数値でない、または0）
    #[error("Invalid BATCH_WRITE_MAX_ATTEMPTS: {0}")]
    InvalidMaxAttempts(String),

    /// 初期待機時間が数値でない
    #[error("Invalid BATCH_WRITE_BASE_DELAY_MS: {0}")]
    InvalidBaseDelay(String),
}

/// DynamoDB設定のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DynamoDbConfigError {
    /// テーブル名が空文字
    #[error("STOCK_PRICES_TABLE must not be empty")]
    EmptyTableName,

    #[error(transparent)]
    BatchWrite(#[from] BatchWriteConfigError),
}

/// BatchWriteItemの再送設定
///
/// 未処理アイテム（UnprocessedItems）を再送する際の試行回数と待機時間を保持する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchWriteConfig {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for BatchWriteConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

impl BatchWriteConfig {
    /// 明示的な値で設定を作成
    ///
    /// `max_attempts`が0の場合は1として扱う。
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// 環境変数から設定を読み込む
    ///
    /// # 環境変数
    /// - BATCH_WRITE_MAX_ATTEMPTS: 1チャンクあたりの最大試行回数（デフォルト: 5）
    /// - BATCH_WRITE_BASE_DELAY_MS: 初回再送前の待機時間（デフォルト: 50）
    pub fn from_env() -> Result<Self, BatchWriteConfigError> {
        let max_attempts = match std::env::var(MAX_ATTEMPTS_ENV) {
            Ok(raw) => match raw.trim().parse::<u32>() {
                Ok(0) | Err(_) => return Err(BatchWriteConfigError::InvalidMaxAttempts(raw)),
                Ok(n) => n,
            },
            Err(_) => DEFAULT_MAX_ATTEMPTS,
        };

        let base_delay_ms = match std::env::var(BASE_DELAY_MS_ENV) {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| BatchWriteConfigError::InvalidBaseDelay(raw.clone()))?,
            Err(_) => DEFAULT_BASE_DELAY_MS,
        };

        Ok(Self {
            max_attempts,
            base_delay: Duration::from_millis(base_delay_ms),
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// `attempt`回目の試行が失敗した後の待機時間（指数バックオフ）
    ///
    /// 1回目の後は`base_delay`、以降は倍々に伸びる。
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
        self.base_delay.saturating_mul(1 << shift)
    }
}

/// テーブル名とクライアントを持つDynamoDB設定
///
/// Lambda実行環境ごとに1度だけ構築し、呼び出し間で共有する。
#[derive(Debug, Clone)]
pub struct DynamoDbConfig {
    /// DynamoDBクライアントインスタンス
    client: DynamoDbClient,
    /// 株価テーブル名
    table_name: String,
    /// バッチ書き込み設定
    batch_write: BatchWriteConfig,
}

impl DynamoDbConfig {
    /// 環境からAWS設定を読み込み、環境変数からテーブル名と書き込み設定を読み取る
    ///
    /// 環境変数:
    /// - AWS認証情報・リージョン: aws-configにより自動読み込み
    /// - STOCK_PRICES_TABLE: 株価テーブル名（デフォルト: demo_stock_prices）
    /// - BATCH_WRITE_MAX_ATTEMPTS / BATCH_WRITE_BASE_DELAY_MS: `BatchWriteConfig::from_env`参照
    pub async fn from_env() -> Result<Self, DynamoDbConfigError> {
        let table_name = table_name_from_env()?;
        let batch_write = BatchWriteConfig::from_env()?;

        // 環境からAWS設定を読み込み（認証情報、リージョンなど）
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = DynamoDbClient::new(&aws_config);

        Ok(Self {
            client,
            table_name,
            batch_write,
        })
    }

    /// DynamoDBクライアントへの参照を取得
    pub fn client(&self) -> &DynamoDbClient {
        &self.client
    }

    /// 株価テーブル名を取得
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn batch_write(&self) -> BatchWriteConfig {
        self.batch_write
    }
}

/// 環境変数からテーブル名を解決
fn table_name_from_env() -> Result<String, DynamoDbConfigError> {
    match std::env::var(TABLE_NAME_ENV) {
        Ok(name) if name.trim().is_empty() => Err(DynamoDbConfigError::EmptyTableName),
        Ok(name) => Ok(name),
        Err(_) => Ok(DEFAULT_TABLE_NAME.to_string()),
    }
}
