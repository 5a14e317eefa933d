pub mod alerts;
pub mod chat;
pub mod demo;
pub mod market;
pub mod ohlc;
pub mod poller;
pub mod time_series;

pub use alerts::{time_ago, AlertBoard, AlertSort, SeverityFilter};
pub use chat::{ChatBackend, ChatSession};
pub use demo::DemoSeries;
pub use market::{demo_history, load_history, make_rng, HistoryView, MarketSource};
pub use ohlc::{JitterPolicy, OhlcSynthesizer, SynthesisConfig};
pub use poller::PollHandle;
pub use time_series::normalize;
