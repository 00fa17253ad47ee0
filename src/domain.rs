// Domain layer modules
pub mod api_response;
pub mod stock_price_item;

// Re-exports
pub use api_response::ApiResponse;
pub use stock_price_item::{ItemValidationError, REQUIRED_FIELDS, StockPriceItem};
