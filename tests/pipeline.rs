use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use cryptodash::chart::{ChartGeometry, ChartLayout};
use cryptodash::models::{HistoricalSeries, RawSeriesPoint};
use cryptodash::services::{normalize, JitterPolicy, OhlcSynthesizer, SynthesisConfig};
use cryptodash::statistics::SeriesSummary;

const DAY_MS: i64 = 86_400_000;

fn three_day_series() -> HistoricalSeries {
    serde_json::from_str(
        r#"{
            "prices": [[0, 100], [86400000, 110], [172800000, 99]],
            "market_caps": [[0, 1000], [86400000, 1100], [172800000, 990]],
            "total_volumes": [[0, 5000], [86400000, 7000]]
        }"#,
    )
    .unwrap()
}

#[test]
fn test_close_only_series_to_chart_and_statistics() {
    let points = normalize(&three_day_series()).unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[2].volume, 0.0);

    let synthesizer = OhlcSynthesizer::new(SynthesisConfig {
        jitter: JitterPolicy::Fixed(0.0),
        ..Default::default()
    })
    .unwrap();
    let records = synthesizer
        .synthesize(&points, &mut StdRng::seed_from_u64(1))
        .unwrap();

    let opens: Vec<f64> = records.iter().map(|r| r.open).collect();
    let closes: Vec<f64> = records.iter().map(|r| r.close).collect();
    assert_eq!(opens, vec![100.0, 100.0, 110.0]);
    assert_eq!(closes, vec![100.0, 110.0, 99.0]);
    assert_eq!(records[1].date_label(), "1970-01-02");
    assert_eq!(records[2].timestamp, 2 * DAY_MS);

    let summary = SeriesSummary::compute(&records).unwrap();
    assert_relative_eq!(summary.period_return_percent, -1.0, epsilon = 1e-12);
    assert_eq!(summary.highest, 110.0);
    assert_eq!(summary.lowest, 99.0);
    assert_eq!(summary.bull_days, 1);
    assert!(summary.highest >= summary.average && summary.average >= summary.lowest);

    let height = 400.0;
    let layout = ChartLayout::default();
    let geometry = ChartGeometry::map(&records, 800.0, height, &layout).unwrap();
    assert_eq!(geometry.candles.len(), 3);
    assert!(geometry.candles.windows(2).all(|w| w[0].x < w[1].x));
    assert!(geometry.candles[1].is_bullish);
    assert!(!geometry.candles[2].is_bullish);
    for candle in &geometry.candles {
        for y in [candle.open_y, candle.close_y, candle.high_y, candle.low_y] {
            assert!(y >= layout.top && y <= height - layout.bottom);
        }
    }
    assert_relative_eq!(
        geometry.scale.scale_y(geometry.scale.padded_min),
        height - layout.bottom
    );
    assert_relative_eq!(geometry.scale.scale_y(geometry.scale.padded_max), layout.top);
}

#[test]
fn test_jittered_candles_keep_their_band() {
    let series = HistoricalSeries {
        prices: (0..60)
            .map(|i| RawSeriesPoint(i * DAY_MS, 20_000.0 + (i as f64 * 0.7).sin() * 1_500.0))
            .collect(),
        ..Default::default()
    };
    let points = normalize(&series).unwrap();

    let synthesizer = OhlcSynthesizer::new(SynthesisConfig {
        jitter: JitterPolicy::Range {
            min: 0.01,
            max: 0.03,
        },
        ..Default::default()
    })
    .unwrap();
    let records = synthesizer
        .synthesize(&points, &mut StdRng::seed_from_u64(42))
        .unwrap();

    for record in &records {
        assert!(record.low <= record.open.min(record.close));
        assert!(record.high >= record.open.max(record.close));
    }

    let summary = SeriesSummary::compute(&records).unwrap();
    assert!(summary.volatility_percent >= 0.0);
    assert_eq!(summary.total_days, 60);
}
