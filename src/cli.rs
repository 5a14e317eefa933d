use clap::Parser;
use std::str::FromStr;
use std::time::Duration;

use crate::api::{DEFAULT_BASE_URL, DEFAULT_WS_URL};
use crate::models::TimeRange;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Backend base url
    #[arg(long, env = "CRYPTODASH_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Live update feed; updates are off when empty
    #[arg(long, env = "CRYPTODASH_WS_URL", default_value = DEFAULT_WS_URL)]
    pub ws_url: String,

    #[arg(short, long, default_value = "bitcoin")]
    pub coin: String,

    #[arg(short, long, value_enum, default_value_t = TimeRange::Month)]
    pub range: TimeRange,

    /// Refresh period for prices, alerts and history, e.g. 30s, 5m, 1h
    #[arg(long, value_parser = parse_duration, default_value = "30s")]
    pub refresh: Duration,

    /// Intraday spread as a fraction of the close
    #[arg(short, long, default_value_t = 0.01)]
    pub jitter: f64,

    /// Upper bound of the spread; each period draws between jitter and jitter-max when set
    #[arg(long)]
    pub jitter_max: Option<f64>,

    /// Seed for reproducible candles
    #[arg(long)]
    pub seed: Option<u64>,

    /// Use generated data instead of the backend
    #[arg(long)]
    pub demo: bool,

    #[arg(long, env = "CRYPTODASH_CHAT_USER", default_value = "guest")]
    pub chat_user: String,
}

pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let secs = if let Some(stripped) = s.strip_suffix('s') {
        u64::from_str(stripped).map_err(|e| e.to_string())?
    } else if let Some(stripped) = s.strip_suffix('m') {
        u64::from_str(stripped).map_err(|e| e.to_string())? * 60
    } else if let Some(stripped) = s.strip_suffix('h') {
        u64::from_str(stripped).map_err(|e| e.to_string())? * 3600
    } else {
        return Err("Invalid duration format. Use formats like 1s, 3m, or 1h.".into());
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("3m").unwrap(), Duration::from_secs(180));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("xs").is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["dashboard"]).unwrap();
        assert_eq!(args.coin, "bitcoin");
        assert_eq!(args.range, TimeRange::Month);
        assert_eq!(args.refresh, Duration::from_secs(30));
        assert_eq!(args.jitter, 0.01);
        assert!(args.jitter_max.is_none());
        assert!(!args.demo);
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "dashboard",
            "--coin",
            "ethereum",
            "--range",
            "7d",
            "--refresh",
            "2m",
            "--jitter",
            "0",
            "--jitter-max",
            "0.05",
            "--seed",
            "7",
            "--demo",
        ])
        .unwrap();
        assert_eq!(args.coin, "ethereum");
        assert_eq!(args.range, TimeRange::Week);
        assert_eq!(args.refresh, Duration::from_secs(120));
        assert_eq!(args.jitter_max, Some(0.05));
        assert_eq!(args.seed, Some(7));
        assert!(args.demo);
        assert!(Args::try_parse_from(["dashboard", "--range", "2w"]).is_err());
    }
}
