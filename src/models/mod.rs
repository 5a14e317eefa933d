mod alert;
mod analysis;
mod candle;
mod chat;
mod market;
mod series;
mod status;
pub(crate) mod timestamp;

pub use alert::{Alert, Severity};
pub use analysis::{
    parse_forecast, AiAnalysis, AnalysisAlert, AnalysisReport, CoinAnalysis, CoinForecast,
    Forecast, Indicators, MacdReading, RsiReading, RsiZone,
};
pub use candle::PeriodRecord;
pub use chat::{
    ChatMessage, Conversation, Envelope, ExchangeReply, NewConversation, OutgoingMessage, Role,
};
pub use market::{CoinInfo, CryptoPrice, PriceBoard, TimeRange};
pub use series::{HistoricalSeries, RawSeriesPoint, SeriesPoint};
pub use status::{ManualAnalysisAck, OverallStatus, ServiceStatus};
pub use timestamp::parse_timestamp;
