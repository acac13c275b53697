pub mod breadth;
pub mod moving_average;
pub mod ratio;

pub use breadth::{below_ma_breadth, BreadthReport};
pub use moving_average::{below_average, moving_average, MaKind, MovingAverage};
pub use ratio::{ratio, zscore, RatioSeries};
