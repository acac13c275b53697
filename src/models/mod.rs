mod candle;
mod interval;
mod price_series;
mod update_config;

pub use candle::Candle;
pub use interval::Interval;
pub use price_series::PriceSeries;
pub use update_config::{UpdateConfig, UpdateStats};
