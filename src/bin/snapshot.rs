use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use cryptodash::{
    api::ApiClient,
    chart::{ChartGeometry, ChartLayout},
    cli::Args,
    config::DashboardConfig,
    helpers::{format_compact, format_percentage, format_usd},
    services::{demo_history, load_history, HistoryView, OhlcSynthesizer},
};

const CANVAS: (f64, f64) = (1200.0, 500.0);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = DashboardConfig::from_args(&args).context("invalid configuration")?;
    let synthesizer = OhlcSynthesizer::new(config.synthesis)?;

    let view = if config.demo {
        info!("demo mode, not contacting {}", config.api_url);
        demo_history(&config.coin.id, config.range, config.seed)?
    } else {
        let client = ApiClient::new(&config.api_url)?;
        match load_history(
            &client,
            &config.coin.id,
            config.range,
            &synthesizer,
            config.seed,
        )
        .await
        {
            Ok(view) => view,
            Err(e) => {
                warn!("history unavailable, using demo data: {e}");
                demo_history(&config.coin.id, config.range, config.seed)?
            }
        }
    };

    print_report(&config, &view)?;
    Ok(())
}

fn print_report(config: &DashboardConfig, view: &HistoryView) -> anyhow::Result<()> {
    println!(
        "{} ({}) over {}",
        config.coin.name, config.coin.symbol, view.range
    );

    match &view.summary {
        Some(summary) => {
            println!("  high        {}", format_usd(summary.highest));
            println!("  low         {}", format_usd(summary.lowest));
            println!("  average     {}", format_usd(summary.average));
            println!(
                "  return      {}",
                format_percentage(summary.period_return_percent)
            );
            println!("  volatility  {:.2}%", summary.volatility_percent);
            println!(
                "  bull days   {}/{}",
                summary.bull_days, summary.total_days
            );
            println!(
                "  volume      avg {} max {} min {}",
                format_compact(summary.average_volume),
                format_compact(summary.max_volume),
                format_compact(summary.min_volume)
            );
        }
        None => println!("  not enough data for statistics"),
    }

    let geometry = ChartGeometry::map(&view.records, CANVAS.0, CANVAS.1, &ChartLayout::default())
        .context("chart layout")?;
    println!(
        "  chart       {} candles, {:.1}px wide, price axis {} to {}",
        geometry.candles.len(),
        geometry.candle_width,
        format_usd(geometry.scale.padded_min),
        format_usd(geometry.scale.padded_max)
    );

    println!();
    println!(
        "  {:<10} {:>12} {:>12} {:>12} {:>12} {:>9} {:>9}",
        "date", "open", "high", "low", "close", "change", "volume"
    );
    for record in view.recent(7) {
        println!(
            "  {:<10} {:>12} {:>12} {:>12} {:>12} {:>9} {:>9}",
            record.date_label(),
            format_usd(record.open),
            format_usd(record.high),
            format_usd(record.low),
            format_usd(record.close),
            format_percentage(record.change_percent),
            format_compact(record.volume)
        );
    }
    Ok(())
}
