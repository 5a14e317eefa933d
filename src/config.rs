use std::time::Duration;

use crate::cli::Args;
use crate::error::{DashboardError, Result};
use crate::models::{CoinInfo, TimeRange};
use crate::services::{JitterPolicy, SynthesisConfig};

const MIN_REFRESH: Duration = Duration::from_secs(1);

/// Validated settings shared by both binaries.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub api_url: String,
    pub ws_url: Option<String>,
    pub coin: CoinInfo,
    pub range: TimeRange,
    pub refresh: Duration,
    pub synthesis: SynthesisConfig,
    pub seed: Option<u64>,
    pub demo: bool,
    pub chat_user: String,
}

impl DashboardConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let jitter = match args.jitter_max {
            Some(max) => JitterPolicy::Range {
                min: args.jitter,
                max,
            },
            None => JitterPolicy::Fixed(args.jitter),
        };
        jitter.validate()?;

        if args.refresh < MIN_REFRESH {
            return Err(DashboardError::InvalidConfig(format!(
                "refresh period must be at least {MIN_REFRESH:?}"
            )));
        }

        let coin = args.coin.trim().to_lowercase();
        if coin.is_empty() {
            return Err(DashboardError::InvalidConfig("coin id is empty".into()));
        }

        let chat_user = args.chat_user.trim();
        if chat_user.is_empty() {
            return Err(DashboardError::InvalidConfig("chat user is empty".into()));
        }

        let ws_url = Some(args.ws_url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        Ok(Self {
            api_url: args.api_url.trim().to_string(),
            ws_url,
            coin: CoinInfo::lookup(&coin),
            range: args.range,
            refresh: args.refresh,
            synthesis: SynthesisConfig {
                jitter,
                ..Default::default()
            },
            seed: args.seed,
            demo: args.demo,
            chat_user: chat_user.to_string(),
        })
    }
}
