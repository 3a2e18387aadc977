//! Market data feeds - WebSocket streaming + REST request/response.

pub mod rest_client;
pub mod ws_client;

pub use rest_client::MarketDataClient;
pub use ws_client::{FeedHandle, FeedState, TickerFeed, WsFeedConfig};
