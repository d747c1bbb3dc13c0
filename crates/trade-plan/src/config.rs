use analysis_core::{Direction, TradingMode};
use anyhow::{anyhow, Context, Result};
use satyland_indicators::AtrLevelsOptions;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    pub atr_period: usize,          // 14
    pub include_extensions: bool,   // false
    pub trading_mode: TradingMode,  // day
    pub use_current_close: bool,    // false, callers decide market hours
    pub direction: Direction,       // bullish
    pub vix: Option<f64>,
}

impl PlanConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            atr_period: env::var("TRADE_PLAN_ATR_PERIOD")
                .unwrap_or_else(|_| "14".to_string())
                .parse()
                .context("TRADE_PLAN_ATR_PERIOD must be a positive integer")?,
            include_extensions: env::var("TRADE_PLAN_INCLUDE_EXTENSIONS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("TRADE_PLAN_INCLUDE_EXTENSIONS must be true or false")?,
            trading_mode: env::var("TRADE_PLAN_TRADING_MODE")
                .unwrap_or_else(|_| "day".to_string())
                .parse::<TradingMode>()
                .map_err(|e| anyhow!("invalid TRADE_PLAN_TRADING_MODE: {}", e))?,
            use_current_close: env::var("TRADE_PLAN_USE_CURRENT_CLOSE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("TRADE_PLAN_USE_CURRENT_CLOSE must be true or false")?,
            direction: env::var("TRADE_PLAN_DIRECTION")
                .unwrap_or_else(|_| "bullish".to_string())
                .parse::<Direction>()
                .map_err(|e| anyhow!("invalid TRADE_PLAN_DIRECTION: {}", e))?,
            vix: env::var("TRADE_PLAN_VIX")
                .ok()
                .filter(|v| !v.is_empty())
                .map(|v| v.parse::<f64>())
                .transpose()
                .context("TRADE_PLAN_VIX must be a number")?,
        };

        Ok(config)
    }

    /// Apply `--flag` overrides on top of the environment.
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        if let Some(v) = flag_value(args, "--direction") {
            self.direction = v.parse::<Direction>().map_err(|e| anyhow!(e))?;
        }
        if let Some(v) = flag_value(args, "--mode") {
            self.trading_mode = v.parse::<TradingMode>().map_err(|e| anyhow!(e))?;
        }
        if let Some(v) = flag_value(args, "--vix") {
            self.vix = Some(v.parse::<f64>().context("--vix must be a number")?);
        }
        if let Some(v) = flag_value(args, "--atr-period") {
            self.atr_period = v.parse::<usize>().context("--atr-period must be a positive integer")?;
        }
        if args.iter().any(|a| a == "--use-current-close") {
            self.use_current_close = true;
        }
        if args.iter().any(|a| a == "--extensions") {
            self.include_extensions = true;
        }
        Ok(())
    }

    pub fn atr_options(&self) -> AtrLevelsOptions {
        AtrLevelsOptions {
            atr_period: self.atr_period,
            include_extensions: self.include_extensions,
            trading_mode: self.trading_mode,
            use_current_close: self.use_current_close,
        }
    }
}

pub fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
