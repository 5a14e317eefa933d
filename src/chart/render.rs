use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Line,
    widgets::{
        canvas::{Canvas, Line as CanvasLine, Rectangle},
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph,
        Wrap,
    },
    Frame,
};

use crate::chart::geometry::{ChartGeometry, ChartLayout};
use crate::helpers::{format_compact, format_number};
use crate::models::PeriodRecord;

const BULL: Color = Color::Green;
const BEAR: Color = Color::Red;
const GRID: Color = Color::DarkGray;

/// Virtual pixels per terminal cell; keeps the pixel layout readable in a small pane.
const PX_PER_COLUMN: f64 = 10.0;
const PX_PER_ROW: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Candles,
    Line,
}

impl ChartKind {
    pub fn toggle(&self) -> Self {
        match self {
            ChartKind::Candles => ChartKind::Line,
            ChartKind::Line => ChartKind::Candles,
        }
    }
}

pub fn render_chart(
    frame: &mut Frame,
    area: Rect,
    kind: ChartKind,
    records: &[PeriodRecord],
    title: &str,
) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    if records.is_empty() {
        render_message(frame, area, block, "No data");
        return;
    }
    match kind {
        ChartKind::Candles => render_candles(frame, area, block, records),
        ChartKind::Line => render_line(frame, area, block, records),
    }
}

pub fn render_message(frame: &mut Frame, area: Rect, block: Block, message: &str) {
    let paragraph = Paragraph::new(message.to_string())
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_candles(frame: &mut Frame, area: Rect, block: Block, records: &[PeriodRecord]) {
    let width = f64::from(area.width) * PX_PER_COLUMN;
    let height = f64::from(area.height) * PX_PER_ROW;

    let geometry = match ChartGeometry::map(records, width, height, &ChartLayout::default()) {
        Ok(geometry) => geometry,
        Err(e) => {
            render_message(frame, area, block, &e.to_string());
            return;
        }
    };

    // Oldest candles scroll off to the left when they do not fit.
    let x_max = geometry.content_width;
    let x_min = x_max - width;
    let flip = |y: f64| height - y;

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([x_min, x_max])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            for line in &geometry.grid {
                ctx.draw(&CanvasLine::new(x_min, flip(line.y), x_max, flip(line.y), GRID));
            }
            ctx.layer();

            for candle in &geometry.candles {
                let color = if candle.is_bullish { BULL } else { BEAR };
                let wick_x = geometry.wick_x(candle);
                ctx.draw(&CanvasLine::new(
                    wick_x,
                    flip(candle.low_y),
                    wick_x,
                    flip(candle.high_y),
                    color,
                ));
                ctx.draw(&Rectangle {
                    x: candle.x,
                    y: flip(candle.body_top + candle.body_height),
                    width: geometry.candle_width,
                    height: candle.body_height,
                    color,
                });
            }
            ctx.layer();

            for line in &geometry.grid {
                ctx.print(x_min, flip(line.y), format!("${}", format_number(line.price)));
            }
            for index in geometry.labelled_indices() {
                let candle = &geometry.candles[index];
                if candle.x >= x_min {
                    ctx.print(candle.x, PX_PER_ROW, records[index].short_date_label());
                }
            }
        });

    frame.render_widget(canvas, area);
}

fn render_line(frame: &mut Frame, area: Rect, block: Block, records: &[PeriodRecord]) {
    let points: Vec<(f64, f64)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (i as f64, r.close))
        .collect();

    let (low, high) = close_range(records);
    let [y_min, y_max] = padded_bounds(low, high);

    let first = records.first().map(|r| r.short_date_label()).unwrap_or_default();
    let last = records.last().map(|r| r.short_date_label()).unwrap_or_default();

    let dataset = Dataset::default()
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Yellow))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(GRID))
                .bounds([0.0, (records.len().max(2) - 1) as f64])
                .labels(vec![Line::from(first), Line::from(last)]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(GRID))
                .bounds([y_min, y_max])
                .labels(vec![
                    Line::from(format!("${}", format_number(low))),
                    Line::from(format!("${}", format_number(high))),
                ]),
        );

    frame.render_widget(chart, area);
}

fn close_range(records: &[PeriodRecord]) -> (f64, f64) {
    records
        .iter()
        .map(|r| r.close)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), close| {
            (low.min(close), high.max(close))
        })
}

/// Y bounds with 10% headroom; a flat series gets a band relative to its price.
fn padded_bounds(low: f64, high: f64) -> [f64; 2] {
    let spread = high - low;
    let pad = if spread > 0.0 {
        spread * 0.1
    } else if high != 0.0 {
        high.abs() * 0.01
    } else {
        1.0
    };
    [low - pad, high + pad]
}

/// One bar per day, newest on the right, coloured like its candle.
pub fn render_volume(frame: &mut Frame, area: Rect, records: &[PeriodRecord]) {
    let slots = usize::from(area.width.saturating_sub(2));
    let shown = &records[records.len().saturating_sub(slots)..];
    let peak = shown.iter().map(|r| r.volume).fold(0.0, f64::max);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Volume (peak {})", format_compact(peak)));
    if shown.is_empty() {
        render_message(frame, area, block, "No data");
        return;
    }

    let bars: Vec<Bar> = shown
        .iter()
        .map(|record| {
            let color = if record.is_bullish() { BULL } else { BEAR };
            Bar::default()
                .value(record.volume.max(0.0).round() as u64)
                .text_value(String::new())
                .style(Style::default().fg(color))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));

    frame.render_widget(chart, area);
}
