mod summary;

pub use summary::{bull_days, period_return_percent, volatility_percent, SeriesSummary};
