use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::chart::render::render_message;
use crate::helpers::{format_compact, format_large_number, format_percentage, format_usd};
use crate::models::{
    AnalysisReport, CoinInfo, OverallStatus, PriceBoard, Role, RsiZone, ServiceStatus, Severity,
};
use crate::services::{time_ago, AlertBoard, ChatSession, HistoryView};

const RECENT_DAYS: usize = 7;

fn change_color(value: f64) -> Color {
    if value >= 0.0 {
        Color::Green
    } else {
        Color::Red
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::High => Color::Red,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Blue,
        Severity::Unknown => Color::Gray,
    }
}

fn titled(title: impl Into<String>) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(title.into())
}

pub fn render_prices(frame: &mut Frame, area: Rect, prices: &PriceBoard, selected: &str) {
    let rows = prices.iter().map(|(id, price)| {
        let coin = CoinInfo::lookup(id);
        let mut name = format!("{} ({})", coin.name, coin.symbol);
        if coin.has_history() {
            name.push_str(" *");
        }
        let style = if id == selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };

        Row::new(vec![
            Cell::from(name),
            Cell::from(format_usd(price.usd)),
            Cell::from(Span::styled(
                format_percentage(price.usd_24h_change),
                Style::default().fg(change_color(price.usd_24h_change)),
            )),
            Cell::from(format_large_number(price.usd_market_cap)),
            Cell::from(format_large_number(price.usd_24h_vol)),
        ])
        .style(style)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(28),
            Constraint::Percentage(20),
            Constraint::Percentage(14),
            Constraint::Percentage(19),
            Constraint::Percentage(19),
        ],
    )
    .header(
        Row::new(vec!["Coin", "Price", "24h", "Market cap", "Volume"])
            .style(Style::default().fg(Color::Yellow)),
    )
    .block(titled("Prices (* has chart)"));

    frame.render_widget(table, area);
}

pub fn summary_lines(view: &HistoryView) -> Vec<Line<'static>> {
    let Some(summary) = &view.summary else {
        return vec![Line::from("Not enough data for statistics")];
    };

    vec![
        Line::from(format!("High      {}", format_usd(summary.highest))),
        Line::from(format!("Low       {}", format_usd(summary.lowest))),
        Line::from(format!("Average   {}", format_usd(summary.average))),
        Line::from(vec![
            Span::raw("Return    "),
            Span::styled(
                format_percentage(summary.period_return_percent),
                Style::default().fg(change_color(summary.period_return_percent)),
            ),
        ]),
        Line::from(format!("Volatility {:.2}%", summary.volatility_percent)),
        Line::from(format!(
            "Bull days {}/{}",
            summary.bull_days, summary.total_days
        )),
        Line::from(format!(
            "Volume    avg {} max {} min {}",
            format_compact(summary.average_volume),
            format_compact(summary.max_volume),
            format_compact(summary.min_volume)
        )),
    ]
}

pub fn render_summary(frame: &mut Frame, area: Rect, coin: &CoinInfo, view: Option<&HistoryView>) {
    let block = titled(format!("{} statistics", coin.symbol));
    match view {
        Some(view) => {
            let paragraph = Paragraph::new(summary_lines(view)).block(block);
            frame.render_widget(paragraph, area);
        }
        None => render_message(frame, area, block, "Loading..."),
    }
}

pub fn render_recent(frame: &mut Frame, area: Rect, view: Option<&HistoryView>) {
    let block = titled("Recent days");
    let Some(view) = view else {
        render_message(frame, area, block, "Loading...");
        return;
    };

    let rows = view.recent(RECENT_DAYS).map(|record| {
        Row::new(vec![
            Cell::from(record.date_label()),
            Cell::from(format_usd(record.open)),
            Cell::from(format_usd(record.high)),
            Cell::from(format_usd(record.low)),
            Cell::from(format_usd(record.close)),
            Cell::from(Span::styled(
                format_percentage(record.change_percent),
                Style::default().fg(change_color(record.change_percent)),
            )),
            Cell::from(format_compact(record.volume)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(11),
            Constraint::Min(10),
            Constraint::Min(10),
            Constraint::Min(10),
            Constraint::Min(10),
            Constraint::Length(9),
            Constraint::Length(8),
        ],
    )
    .header(
        Row::new(vec!["Date", "Open", "High", "Low", "Close", "Change", "Volume"])
            .style(Style::default().fg(Color::Yellow)),
    )
    .block(block);

    frame.render_widget(table, area);
}

pub fn render_alerts(frame: &mut Frame, area: Rect, board: &AlertBoard, now: DateTime<Utc>) {
    let title = format!(
        "Alerts ({} active) filter {} sort {:?}",
        board.active_count(),
        board.filter.label(),
        board.sort
    );
    let block = titled(title);

    let visible = board.visible();
    if visible.is_empty() {
        render_message(frame, area, block, "No alerts");
        return;
    }

    let lines: Vec<Line> = visible
        .iter()
        .map(|alert| {
            Line::from(vec![
                Span::styled(
                    format!("{:<7}", alert.severity.label()),
                    Style::default().fg(severity_color(alert.severity)),
                ),
                Span::raw(format!(
                    "{} {} ",
                    alert.coin.to_uppercase(),
                    alert.message
                )),
                Span::styled(
                    time_ago(now, alert.timestamp),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn analysis_lines(report: &AnalysisReport) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for coin in &report.data {
        let info = CoinInfo::lookup(&coin.coin);
        let mut text = format!("{} {}", info.symbol, format_usd(coin.price.usd));
        if let Some(rsi) = coin.indicators.rsi {
            text.push_str(&format!(
                "  RSI {:.1} {}",
                rsi.value,
                RsiZone::classify(rsi.value).label()
            ));
        }
        if let Some(macd) = coin.indicators.macd {
            text.push_str(&format!("  MACD hist {:.2}", macd.value_macd_hist));
        }
        lines.push(Line::from(text));
    }

    match report.forecast() {
        Ok(Some(forecast)) => {
            for (coin, prediction) in &forecast {
                let steps: Vec<String> = prediction
                    .step_changes()
                    .iter()
                    .map(|(day, change)| format!("d{day} {}", format_percentage(*change)))
                    .collect();
                lines.push(Line::from(format!(
                    "Forecast {} next {} {}",
                    CoinInfo::lookup(coin).symbol,
                    format_usd(prediction.next_day),
                    steps.join(" ")
                )));
            }
        }
        Ok(None) => {}
        Err(e) => lines.push(Line::from(format!("Forecast unavailable: {e}"))),
    }

    if !report.ai_analysis.analysis.is_empty() {
        lines.push(Line::from(""));
        lines.extend(
            report
                .ai_analysis
                .analysis
                .lines()
                .map(|l| Line::from(l.to_string())),
        );
    }
    lines
}

pub fn render_analysis(frame: &mut Frame, area: Rect, report: Option<&AnalysisReport>) {
    let block = titled("Analysis");
    match report {
        Some(report) => {
            let paragraph = Paragraph::new(analysis_lines(report))
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
        }
        None => render_message(frame, area, block, "No analysis yet (press a to request one)"),
    }
}

pub fn render_status(frame: &mut Frame, area: Rect, status: Option<&ServiceStatus>, notice: &str) {
    let mut spans = match status.map(ServiceStatus::overall) {
        Some(overall) => {
            let color = match overall {
                OverallStatus::Operational => Color::Green,
                OverallStatus::PartialOutage { .. } => Color::Yellow,
                OverallStatus::MajorOutage => Color::Red,
            };
            vec![Span::styled(overall.message(), Style::default().fg(color))]
        }
        None => vec![Span::styled(
            "Status unknown",
            Style::default().fg(Color::DarkGray),
        )],
    };
    if !notice.is_empty() {
        spans.push(Span::raw(format!("  {notice}")));
    }
    spans.push(Span::styled(
        "  q quit  r refresh  t range  n coin  k chart  v volume  f filter  s sort  d dismiss  a analyse  c chat",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// A popup anchored to the bottom right of `area`.
pub fn chat_area(area: Rect, minimized: bool) -> Rect {
    let width = area.width.min(60);
    let height = if minimized { 3 } else { area.height.min(20) };
    Rect {
        x: area.x + area.width - width,
        y: area.y + area.height - height,
        width,
        height,
    }
}

pub fn chat_title(session: &ChatSession) -> String {
    let mut title = match (session.conversation(), session.position()) {
        (Some(conversation), Some(position)) => format!(
            "{} ({position}/{})",
            conversation.title,
            session.conversations().len()
        ),
        (Some(conversation), None) => conversation.title.clone(),
        (None, _) => "AI assistant".to_string(),
    };
    if session.is_loading() {
        title.push_str(" thinking...");
    }
    title
}

pub fn render_chat(frame: &mut Frame, area: Rect, session: &ChatSession) {
    if !session.is_open {
        return;
    }
    let popup = chat_area(area, session.is_minimized);
    frame.render_widget(Clear, popup);

    let block = titled(chat_title(session)).border_style(Style::default().fg(Color::Cyan));

    if session.is_minimized {
        frame.render_widget(block, popup);
        return;
    }

    let mut lines: Vec<Line> = session
        .messages()
        .iter()
        .map(|message| {
            let (who, color) = match message.role {
                Role::User => ("you", Color::Cyan),
                Role::Assistant => ("ai", Color::Magenta),
            };
            Line::from(vec![
                Span::styled(format!("{who}: "), Style::default().fg(color)),
                Span::raw(message.content.clone()),
            ])
        })
        .collect();
    if session.conversation().is_none() {
        lines.push(Line::from("Connecting..."));
    }
    lines.push(Line::from(Span::styled(
        "Enter send ^N new ^O next ^D delete Tab hide Esc close",
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(format!("> {}", session.input)));

    // Keep the input line visible once the history overflows.
    let inner_height = popup.height.saturating_sub(2) as usize;
    let skip = lines.len().saturating_sub(inner_height);
    let visible: Vec<Line> = lines.into_iter().skip(skip).collect();

    frame.render_widget(Paragraph::new(visible).block(block), popup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AiAnalysis, CoinAnalysis, CryptoPrice, Indicators, RsiReading, TimeRange};
    use crate::statistics::SeriesSummary;
    use ratatui::{backend::TestBackend, Terminal};

    fn text(lines: &[Line]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    fn sample_summary() -> SeriesSummary {
        SeriesSummary {
            highest: 110.0,
            lowest: 95.0,
            average: 103.0,
            period_return_percent: -1.0,
            volatility_percent: 7.5,
            bull_days: 1,
            total_days: 3,
            average_volume: 2_000_000.0,
            max_volume: 3_000_000.0,
            min_volume: 1_000_000.0,
        }
    }

    #[test]
    fn test_summary_lines() {
        let mut view = HistoryView::from_records("bitcoin", TimeRange::Week, Vec::new());
        assert_eq!(text(&summary_lines(&view)), vec!["Not enough data for statistics"]);

        view.summary = Some(sample_summary());
        let lines = text(&summary_lines(&view));
        assert!(lines.iter().any(|l| l.contains("-1.00%")));
        assert!(lines.iter().any(|l| l.contains("Bull days 1/3")));
    }

    #[test]
    fn test_analysis_lines_include_rsi_zone_and_forecast() {
        let report = AnalysisReport {
            timestamp: Utc::now(),
            data: vec![CoinAnalysis {
                coin: "bitcoin".into(),
                price: CryptoPrice {
                    usd: 50_000.0,
                    usd_market_cap: 0.0,
                    usd_24h_vol: 0.0,
                    usd_24h_change: 0.0,
                },
                indicators: Indicators {
                    rsi: Some(RsiReading { value: 75.0 }),
                    macd: None,
                },
            }],
            ai_analysis: AiAnalysis {
                analysis: "Momentum is strong.".into(),
                trading_signals: vec![],
                lstm_forecast: Some(serde_json::json!(
                    r#"{"bitcoin":{"next_day":51000,"multi_step":[100,110]}}"#
                )),
            },
            alerts: vec![],
        };

        let lines = text(&analysis_lines(&report));
        assert!(lines[0].starts_with("BTC"));
        assert!(lines[0].contains("Overbought"));
        assert!(lines[1].contains("Forecast BTC"));
        assert!(lines[1].contains("d2 +10.00%"));
        assert_eq!(lines.last().unwrap(), "Momentum is strong.");
    }

    #[test]
    fn test_chat_title_before_connecting() {
        let mut session = ChatSession::new("guest");
        assert_eq!(chat_title(&session), "AI assistant");

        session.toggle_open();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|frame| render_chat(frame, frame.area(), &session))
            .unwrap();
        let rendered: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(rendered.contains("Connecting..."));
        assert!(rendered.contains("^D delete"));
    }

    #[test]
    fn test_chat_area_hugs_bottom_right() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(chat_area(area, false), Rect::new(40, 20, 60, 20));
        assert_eq!(chat_area(area, true), Rect::new(40, 37, 60, 3));

        let small = Rect::new(0, 0, 30, 10);
        assert_eq!(chat_area(small, false), Rect::new(0, 0, 30, 10));
    }

    #[test]
    fn test_prices_table_renders_symbols() {
        let mut prices = PriceBoard::new();
        prices.insert(
            "ethereum".into(),
            CryptoPrice {
                usd: 2500.0,
                usd_market_cap: 3.0e11,
                usd_24h_vol: 1.2e10,
                usd_24h_change: -1.5,
            },
        );

        let mut terminal = Terminal::new(TestBackend::new(100, 5)).unwrap();
        terminal
            .draw(|frame| render_prices(frame, frame.area(), &prices, "ethereum"))
            .unwrap();

        let rendered: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(rendered.contains("Ethereum (ETH) *"));
        assert!(rendered.contains("-1.50%"));
    }
}
