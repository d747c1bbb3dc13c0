//! trade-plan: run the Saty indicator stack over OHLCV files and print the
//! trade plan as JSON.
//!
//! Bar files are JSON arrays of `{timestamp, open, high, low, close, volume}`
//! in chronological order.
//!
//! Usage:
//!   trade-plan --daily spy_1d.json
//!   trade-plan --daily spy_1d.json --intraday spy_5m.json --premarket spy_pm.json
//!   trade-plan --daily spy_1d.json --atr-source spy_1w.json --mode multiday --vix 15.2
//!   trade-plan --daily spy_1d.json --mtf 1h=spy_1h.json --mtf 1w=spy_1w.json

mod config;

use std::collections::BTreeMap;
use std::path::Path;

use analysis_core::Bar;
use anyhow::{bail, Context, Result};
use config::{flag_value, PlanConfig};
use satyland_indicators::{key_pivots, open_gaps};
use satyland_screener::{calculate_trade_plan, TradePlanInputs};

fn load_bars(path: &str) -> Result<Vec<Bar>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let bars: Vec<Bar> =
        serde_json::from_str(&raw).with_context(|| format!("parsing bars from {}", path))?;
    tracing::info!("Loaded {} bars from {}", bars.len(), path);
    Ok(bars)
}

fn load_optional(args: &[String], flag: &str) -> Result<Option<Vec<Bar>>> {
    flag_value(args, flag).map(load_bars).transpose()
}

/// Every `--mtf <label>=<file>` pair.
fn load_mtf(args: &[String]) -> Result<BTreeMap<String, Vec<Bar>>> {
    let mut mtf = BTreeMap::new();
    for (i, arg) in args.iter().enumerate() {
        if arg != "--mtf" {
            continue;
        }
        let Some(pair) = args.get(i + 1) else {
            bail!("--mtf needs <label>=<file>");
        };
        let Some((label, path)) = pair.split_once('=') else {
            bail!("--mtf expects <label>=<file>, got '{}'", pair);
        };
        mtf.insert(label.to_string(), load_bars(path)?);
    }
    Ok(mtf)
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  trade-plan --daily <file> [options]");
    eprintln!();
    eprintln!("Inputs:");
    eprintln!("  --daily FILE           Daily bars (required)");
    eprintln!("  --intraday FILE        Chart timeframe bars (default: daily)");
    eprintln!("  --atr-source FILE      Bars at the trading mode's timeframe (default: daily)");
    eprintln!("  --premarket FILE       Today's premarket session");
    eprintln!("  --mtf LABEL=FILE       Higher-timeframe bars, repeatable");
    eprintln!();
    eprintln!("Options (override TRADE_PLAN_* environment variables):");
    eprintln!("  --ticker SYMBOL        Label for the output (default: daily file stem)");
    eprintln!("  --timeframe LABEL      Chart timeframe label (default: 1d)");
    eprintln!("  --direction DIR        bullish | bearish");
    eprintln!("  --mode MODE            day | multiday | swing | position");
    eprintln!("  --vix VALUE            Current VIX reading");
    eprintln!("  --atr-period N         Wilder ATR period");
    eprintln!("  --use-current-close    Anchor on the last bar (after the close)");
    eprintln!("  --extensions           Include extension levels");
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trade_plan=info,satyland_screener=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let Some(daily_path) = flag_value(&args, "--daily") else {
        print_usage();
        std::process::exit(1);
    };

    let mut config = PlanConfig::from_env()?;
    config.apply_args(&args)?;

    let ticker = flag_value(&args, "--ticker")
        .map(str::to_string)
        .or_else(|| {
            Path::new(daily_path)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "UNKNOWN".to_string());

    let daily = load_bars(daily_path)?;
    let intraday = load_optional(&args, "--intraday")?.unwrap_or_else(|| daily.clone());
    let atr_source = load_optional(&args, "--atr-source")?.unwrap_or_else(|| daily.clone());
    let premarket = load_optional(&args, "--premarket")?;
    let mtf = load_mtf(&args)?;

    let timeframe = flag_value(&args, "--timeframe").unwrap_or("1d").to_string();

    let inputs = TradePlanInputs {
        ticker,
        timeframe,
        atr_source,
        intraday,
        daily: Some(daily.clone()),
        premarket,
        mtf,
        direction: config.direction,
        vix: config.vix,
        options: config.atr_options(),
    };

    let plan = calculate_trade_plan(&inputs).context("building trade plan")?;
    tracing::info!(
        "{} {}: grade {} ({}/{})",
        plan.ticker,
        plan.direction,
        plan.green_flag.grade.as_str(),
        plan.green_flag.score,
        plan.green_flag.max_score
    );

    let mut output = serde_json::to_value(&plan)?;
    if let Some(obj) = output.as_object_mut() {
        match key_pivots(&daily) {
            Ok(pivots) => {
                obj.insert("key_pivots".to_string(), serde_json::to_value(pivots)?);
            }
            Err(e) => {
                tracing::warn!("Key pivots unavailable: {}", e);
                obj.insert("key_pivots".to_string(), serde_json::Value::Null);
            }
        }
        match open_gaps(&daily) {
            Ok(gaps) => {
                obj.insert("open_gaps".to_string(), serde_json::to_value(gaps)?);
            }
            Err(e) => {
                tracing::warn!("Open gaps unavailable: {}", e);
                obj.insert("open_gaps".to_string(), serde_json::Value::Null);
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
