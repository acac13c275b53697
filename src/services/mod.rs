pub mod cache;
pub mod ticker_list;
pub mod updater;
pub mod yahoo;

pub use cache::{CacheEntry, CacheKey, CacheStore};
pub use ticker_list::load_tickers;
pub use updater::DataUpdater;
pub use yahoo::{HistoryProvider, YahooClient, YahooError};
