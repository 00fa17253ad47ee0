// Infrastructure layer modules
pub mod config;
pub mod logging;
pub mod stock_price_repository;

// Re-exports
pub use config::{BatchWriteConfig, BatchWriteConfigError, DynamoDbConfig, DynamoDbConfigError};
pub use logging::{init_logging, record_status_code, request_span};
pub use stock_price_repository::{
    BATCH_WRITE_LIMIT, BatchWriteClient, DynamoStockPriceRepository, RepositoryError,
    StockPriceRepository,
};
