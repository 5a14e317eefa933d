use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{DashboardError, Result};
use crate::models::{
    Alert, AnalysisReport, HistoricalSeries, PeriodRecord, PriceBoard, ServiceStatus, TimeRange,
};
use crate::services::demo::DemoSeries;
use crate::services::ohlc::OhlcSynthesizer;
use crate::services::time_series::normalize;
use crate::statistics::SeriesSummary;

/// The read side of the backend, as the dashboard views consume it.
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn prices(&self) -> Result<PriceBoard>;

    async fn history(&self, coin_id: &str, days: u32) -> Result<HistoricalSeries>;

    async fn analysis(&self) -> Result<AnalysisReport>;

    async fn alerts(&self) -> Result<Vec<Alert>>;

    async fn status(&self) -> Result<ServiceStatus>;
}

/// Candles and summary for one coin and time range.
#[derive(Debug, Clone)]
pub struct HistoryView {
    pub coin_id: String,
    pub range: TimeRange,
    pub records: Vec<PeriodRecord>,
    /// `None` when the series is too short for day-over-day statistics.
    pub summary: Option<SeriesSummary>,
}

impl HistoryView {
    pub fn from_series(
        coin_id: &str,
        range: TimeRange,
        series: &HistoricalSeries,
        synthesizer: &OhlcSynthesizer,
        rng: &mut StdRng,
    ) -> Result<Self> {
        let points = normalize(series)?;
        let records = synthesizer.synthesize(&points, rng)?;
        Ok(Self::from_records(coin_id, range, records))
    }

    pub fn from_records(coin_id: &str, range: TimeRange, records: Vec<PeriodRecord>) -> Self {
        let summary = match SeriesSummary::compute(&records) {
            Ok(summary) => Some(summary),
            Err(DashboardError::InsufficientData { actual, .. }) => {
                warn!("{coin_id}: {actual} record(s) is too few for statistics");
                None
            }
            Err(e) => {
                warn!("{coin_id}: statistics unavailable: {e}");
                None
            }
        };

        Self {
            coin_id: coin_id.to_string(),
            range,
            records,
            summary,
        }
    }

    pub fn latest(&self) -> Option<&PeriodRecord> {
        self.records.last()
    }

    /// The last `count` records, newest first, for the recent-days table.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &PeriodRecord> {
        self.records.iter().rev().take(count)
    }
}

/// A seeded generator when a seed is configured, otherwise one from the OS.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

pub async fn load_history(
    source: &dyn MarketSource,
    coin_id: &str,
    range: TimeRange,
    synthesizer: &OhlcSynthesizer,
    seed: Option<u64>,
) -> Result<HistoryView> {
    let series = source.history(coin_id, range.days()).await?;
    info!(
        "{coin_id}: fetched {} price points for {range}",
        series.prices.len()
    );
    let mut rng = make_rng(seed);
    HistoryView::from_series(coin_id, range, &series, synthesizer, &mut rng)
}

/// Generated candles for when the backend cannot serve history.
pub fn demo_history(coin_id: &str, range: TimeRange, seed: Option<u64>) -> Result<HistoryView> {
    let demo = DemoSeries::new()?;
    let mut rng = make_rng(seed);
    let records = demo.generate(coin_id, range.days(), Utc::now(), &mut rng);
    Ok(HistoryView::from_records(coin_id, range, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawSeriesPoint;
    use crate::services::ohlc::{JitterPolicy, SynthesisConfig};
    use approx::assert_relative_eq;

    struct FixedSource {
        prices: Vec<f64>,
    }

    #[async_trait]
    impl MarketSource for FixedSource {
        async fn prices(&self) -> Result<PriceBoard> {
            Ok(PriceBoard::new())
        }

        async fn history(&self, _coin_id: &str, days: u32) -> Result<HistoricalSeries> {
            let prices = self
                .prices
                .iter()
                .take(days as usize)
                .enumerate()
                .map(|(i, p)| RawSeriesPoint(i as i64 * 86_400_000, *p))
                .collect();
            Ok(HistoricalSeries {
                prices,
                ..Default::default()
            })
        }

        async fn analysis(&self) -> Result<AnalysisReport> {
            Err(DashboardError::MalformedResponse("unused".into()))
        }

        async fn alerts(&self) -> Result<Vec<Alert>> {
            Ok(Vec::new())
        }

        async fn status(&self) -> Result<ServiceStatus> {
            Err(DashboardError::MalformedResponse("unused".into()))
        }
    }

    fn synthesizer() -> OhlcSynthesizer {
        OhlcSynthesizer::new(SynthesisConfig {
            jitter: JitterPolicy::Fixed(0.0),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_load_history_runs_pipeline() {
        let source = FixedSource {
            prices: vec![100.0, 110.0, 99.0],
        };
        let view = load_history(&source, "bitcoin", TimeRange::Week, &synthesizer(), Some(9))
            .await
            .unwrap();

        assert_eq!(view.records.len(), 3);
        assert_eq!(view.latest().unwrap().close, 99.0);
        let recent: Vec<f64> = view.recent(2).map(|r| r.close).collect();
        assert_eq!(recent, vec![99.0, 110.0]);
        assert_relative_eq!(
            view.summary.unwrap().period_return_percent,
            -1.0,
            epsilon = 1e-12
        );
    }

    #[tokio::test]
    async fn test_single_point_history_has_no_summary() {
        let source = FixedSource { prices: vec![42.0] };
        let view = load_history(&source, "bitcoin", TimeRange::Week, &synthesizer(), None)
            .await
            .unwrap();
        assert_eq!(view.records.len(), 1);
        assert!(view.summary.is_none());
    }

    #[test]
    fn test_demo_history_is_seeded() {
        let a = demo_history("ethereum", TimeRange::Month, Some(5)).unwrap();
        let b = demo_history("ethereum", TimeRange::Month, Some(5)).unwrap();
        assert_eq!(a.records.len(), 30);
        assert_eq!(a.records[0].open, 2_500.0);
        assert_eq!(
            a.records.iter().map(|r| r.close).collect::<Vec<_>>(),
            b.records.iter().map(|r| r.close).collect::<Vec<_>>()
        );
        assert!(a.summary.is_some());
    }

    #[tokio::test]
    async fn test_empty_history_is_an_error() {
        let source = FixedSource { prices: vec![] };
        let result = load_history(&source, "bitcoin", TimeRange::Week, &synthesizer(), None).await;
        assert!(matches!(result, Err(DashboardError::EmptySeries)));
    }
}
