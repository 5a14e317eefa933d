use crate::error::{DashboardError, Result};
use crate::models::PeriodRecord;

const PRICE_PADDING: f64 = 0.1;
const GRID_LINES: usize = 8;
const DATE_LABELS: usize = 10;

/// Margins and spacing in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub spacing: f64,
    pub min_candle_width: f64,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            left: 70.0,
            right: 50.0,
            top: 50.0,
            bottom: 50.0,
            spacing: 2.0,
            min_candle_width: 8.0,
        }
    }
}

/// Vertical mapping from price to canvas y, where y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceScale {
    pub min_price: f64,
    pub max_price: f64,
    pub price_range: f64,
    pub padded_min: f64,
    pub padded_max: f64,
    plot_bottom: f64,
    plot_top: f64,
}

impl PriceScale {
    fn new(min_price: f64, max_price: f64, canvas_height: f64, layout: &ChartLayout) -> Self {
        let price_range = max_price - min_price;
        let padding = price_range * PRICE_PADDING;
        Self {
            min_price,
            max_price,
            price_range,
            padded_min: min_price - padding,
            padded_max: max_price + padding,
            plot_bottom: canvas_height - layout.bottom,
            plot_top: layout.top,
        }
    }

    pub fn padded_range(&self) -> f64 {
        self.padded_max - self.padded_min
    }

    pub fn plot_height(&self) -> f64 {
        self.plot_bottom - self.plot_top
    }

    /// Flat series collapse onto the middle of the plot area.
    pub fn scale_y(&self, price: f64) -> f64 {
        let range = self.padded_range();
        if range == 0.0 || !range.is_finite() {
            return self.plot_top + self.plot_height() / 2.0;
        }
        self.plot_bottom - (price - self.padded_min) / range * self.plot_height()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandleGeometry {
    pub x: f64,
    pub open_y: f64,
    pub high_y: f64,
    pub low_y: f64,
    pub close_y: f64,
    pub body_top: f64,
    pub body_height: f64,
    pub is_bullish: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub price: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartGeometry {
    pub scale: PriceScale,
    pub candle_width: f64,
    pub wick_width: f64,
    /// Canvas width needed to fit every candle; at least the requested width.
    pub content_width: f64,
    pub candles: Vec<CandleGeometry>,
    pub grid: Vec<GridLine>,
    pub label_stride: usize,
}

impl ChartGeometry {
    pub fn map(
        records: &[PeriodRecord],
        canvas_width: f64,
        canvas_height: f64,
        layout: &ChartLayout,
    ) -> Result<Self> {
        if records.is_empty() {
            return Err(DashboardError::EmptySeries);
        }
        if !(canvas_width > 0.0) || !(canvas_height > layout.top + layout.bottom) {
            return Err(DashboardError::InvalidConfig(format!(
                "canvas {canvas_width}x{canvas_height} too small for the chart margins"
            )));
        }

        let min_price = records.iter().map(|r| r.low).fold(f64::INFINITY, f64::min);
        let max_price = records.iter().map(|r| r.high).fold(f64::NEG_INFINITY, f64::max);
        let scale = PriceScale::new(min_price, max_price, canvas_height, layout);

        let count = records.len() as f64;
        let usable_width = canvas_width - layout.left - layout.right;
        let candle_width = (usable_width / count - layout.spacing).max(layout.min_candle_width);
        let wick_width = (candle_width / 4.0).max(1.0);
        let step = candle_width + layout.spacing;

        let candles = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let open_y = scale.scale_y(record.open);
                let close_y = scale.scale_y(record.close);
                CandleGeometry {
                    x: layout.left + index as f64 * step,
                    open_y,
                    high_y: scale.scale_y(record.high),
                    low_y: scale.scale_y(record.low),
                    close_y,
                    body_top: open_y.min(close_y),
                    body_height: (close_y - open_y).abs().max(1.0),
                    is_bullish: record.is_bullish(),
                }
            })
            .collect();

        let grid = (0..GRID_LINES)
            .map(|i| {
                let price =
                    scale.padded_min + scale.padded_range() * i as f64 / (GRID_LINES - 1) as f64;
                GridLine {
                    price,
                    y: scale.scale_y(price),
                }
            })
            .collect();

        Ok(Self {
            scale,
            candle_width,
            wick_width,
            content_width: canvas_width.max(count * step + layout.left + layout.right),
            candles,
            grid,
            label_stride: (records.len() / DATE_LABELS).max(1),
        })
    }

    pub fn wick_x(&self, candle: &CandleGeometry) -> f64 {
        candle.x + self.candle_width / 2.0
    }

    pub fn labelled_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.candles.len()).step_by(self.label_stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    const W: f64 = 800.0;
    const H: f64 = 400.0;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> PeriodRecord {
        PeriodRecord {
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            timestamp: 0,
            open,
            high,
            low,
            close,
            volume: 0.0,
            change: close - open,
            change_percent: 0.0,
        }
    }

    fn sample() -> Vec<PeriodRecord> {
        vec![
            candle(100.0, 101.0, 98.0, 100.0),
            candle(100.0, 112.0, 99.0, 110.0),
            candle(110.0, 111.0, 97.0, 99.0),
        ]
    }

    #[test]
    fn test_scale_and_padding() {
        let geometry = ChartGeometry::map(&sample(), W, H, &ChartLayout::default()).unwrap();
        let scale = geometry.scale;

        assert_eq!(scale.min_price, 97.0);
        assert_eq!(scale.max_price, 112.0);
        assert_relative_eq!(scale.padded_min, 95.5, epsilon = 1e-9);
        assert_relative_eq!(scale.padded_max, 113.5, epsilon = 1e-9);

        assert_eq!(scale.scale_y(scale.padded_min), H - 50.0);
        assert_eq!(scale.scale_y(scale.padded_max), 50.0);
    }

    #[test]
    fn test_candles_stay_inside_canvas_in_order() {
        let geometry = ChartGeometry::map(&sample(), W, H, &ChartLayout::default()).unwrap();

        assert!(geometry.candles.windows(2).all(|w| w[0].x < w[1].x));
        for c in &geometry.candles {
            for y in [c.open_y, c.high_y, c.low_y, c.close_y] {
                assert!((50.0..=H - 50.0).contains(&y), "y = {y}");
                assert!((0.0..=H).contains(&y));
            }
            assert!(c.high_y <= c.body_top);
            assert!(c.body_top + c.body_height <= c.low_y + 1.0);
        }

        assert!(!geometry.candles[0].is_bullish);
        assert!(geometry.candles[1].is_bullish);
        assert!(!geometry.candles[2].is_bullish);
        assert_eq!(geometry.candles[0].body_height, 1.0);
    }

    #[test]
    fn test_candle_width_and_positions() {
        let layout = ChartLayout::default();
        let geometry = ChartGeometry::map(&sample(), W, H, &layout).unwrap();

        // (800 - 70 - 50) / 3 - 2
        assert_relative_eq!(geometry.candle_width, 680.0 / 3.0 - 2.0, epsilon = 1e-9);
        assert_eq!(geometry.candles[0].x, 70.0);
        assert_relative_eq!(geometry.candles[2].x, 70.0 + 2.0 * 680.0 / 3.0, epsilon = 1e-9);
        assert_eq!(geometry.content_width, W);

        let many: Vec<PeriodRecord> = (0..365).map(|_| candle(1.0, 2.0, 0.5, 1.5)).collect();
        let dense = ChartGeometry::map(&many, W, H, &layout).unwrap();
        assert_eq!(dense.candle_width, layout.min_candle_width);
        assert_eq!(dense.wick_width, 2.0);
        assert_eq!(dense.content_width, 365.0 * 10.0 + 120.0);
        assert_eq!(dense.label_stride, 36);
        assert_eq!(dense.labelled_indices().count(), 11);
    }

    #[test]
    fn test_flat_and_single_record_series() {
        let flat = vec![candle(5.0, 5.0, 5.0, 5.0); 4];
        let geometry = ChartGeometry::map(&flat, W, H, &ChartLayout::default()).unwrap();
        let mid = 50.0 + (H - 100.0) / 2.0;
        for c in &geometry.candles {
            assert_eq!(c.open_y, mid);
            assert_eq!(c.high_y, mid);
            assert_eq!(c.low_y, mid);
        }
        assert!(geometry.grid.iter().all(|g| g.y == mid));

        let single = vec![candle(42.0, 42.0, 42.0, 42.0)];
        let geometry = ChartGeometry::map(&single, W, H, &ChartLayout::default()).unwrap();
        assert_eq!(geometry.scale.price_range, 0.0);
        assert_eq!(geometry.candles[0].close_y, mid);
        assert_eq!(geometry.label_stride, 1);
    }

    #[test]
    fn test_grid_spans_padded_range() {
        let geometry = ChartGeometry::map(&sample(), W, H, &ChartLayout::default()).unwrap();
        assert_eq!(geometry.grid.len(), 8);
        assert_eq!(geometry.grid[0].y, H - 50.0);
        assert_relative_eq!(geometry.grid[7].y, 50.0, epsilon = 1e-9);
        assert!(geometry.grid.windows(2).all(|w| w[0].price < w[1].price));
    }

    #[test]
    fn test_rejects_empty_and_tiny_canvas() {
        let layout = ChartLayout::default();
        assert!(matches!(
            ChartGeometry::map(&[], W, H, &layout),
            Err(DashboardError::EmptySeries)
        ));
        assert!(matches!(
            ChartGeometry::map(&sample(), W, 100.0, &layout),
            Err(DashboardError::InvalidConfig(_))
        ));
    }
}
