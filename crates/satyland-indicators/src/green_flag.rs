//! Green Flag Checklist: ten confirmations scored into an A+/A/B/skip grade.

use std::collections::BTreeMap;

use analysis_core::Direction;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::atr_levels::AtrLevels;
use crate::phase_oscillator::{Phase, PhaseOscillator};
use crate::pivot_ribbon::{PivotRibbon, RibbonState};
use crate::price_structure::PriceStructure;

pub const MAX_SCORE: u32 = 10;

const CONFLUENCE_TOLERANCE: f64 = 0.005;
const VIX_BULLISH_BELOW: f64 = 17.0;
const VIX_BEARISH_ABOVE: f64 = 20.0;

/// The ten flags. `vix_bias` is `None` when no VIX reading was given and
/// never counts toward the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistFlags {
    pub direction: Direction,
    pub trend_ribbon_stacked: bool,
    /// Price above the 48 EMA cloud for bullish, below it for bearish
    pub price_vs_cloud: bool,
    pub trigger_hit: bool,
    pub structure_confirmed: bool,
    pub mtf_aligned: bool,
    pub momentum_confirmed: bool,
    pub squeeze: bool,
    pub atr_room_ok: bool,
    pub vix_bias: Option<bool>,
    pub confluence_bonus: bool,
}

impl ChecklistFlags {
    pub fn cloud_key(&self) -> &'static str {
        match self.direction {
            Direction::Bullish => "price_above_cloud",
            Direction::Bearish => "price_below_cloud",
        }
    }

    /// Flags in checklist order, keyed by their serialized names.
    pub fn entries(&self) -> [(&'static str, Option<bool>); 10] {
        [
            ("trend_ribbon_stacked", Some(self.trend_ribbon_stacked)),
            (self.cloud_key(), Some(self.price_vs_cloud)),
            ("trigger_hit", Some(self.trigger_hit)),
            ("structure_confirmed", Some(self.structure_confirmed)),
            ("mtf_aligned", Some(self.mtf_aligned)),
            ("momentum_confirmed", Some(self.momentum_confirmed)),
            ("squeeze", Some(self.squeeze)),
            ("atr_room_ok", Some(self.atr_room_ok)),
            ("vix_bias", self.vix_bias),
            ("confluence_bonus", Some(self.confluence_bonus)),
        ]
    }

    /// Number of flags that are exactly true.
    pub fn score(&self) -> u32 {
        self.entries()
            .iter()
            .filter(|(_, v)| *v == Some(true))
            .count() as u32
    }
}

impl Serialize for ChecklistFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, &value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    #[serde(rename = "skip")]
    Skip,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 5 => Grade::APlus,
            4 => Grade::A,
            3 => Grade::B,
            _ => Grade::Skip,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::Skip => "skip",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Grade::APlus => "High-conviction entry. Full size per Rule of 10.",
            Grade::A => "Good setup. Standard size.",
            Grade::B => "Marginal. Reduce size or wait for one more confirmation.",
            Grade::Skip => "Insufficient confirmations. WAIT — do not force the trade.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GreenFlagChecklist {
    pub direction: Direction,
    pub score: u32,
    pub max_score: u32,
    pub grade: Grade,
    pub recommendation: String,
    pub flags: ChecklistFlags,
    pub verbal_audit: String,
}

/// Pre-trade narration. Only the setup name depends on the flags; the
/// rest is picked by direction.
pub fn verbal_audit(direction: Direction, trend_stacked: bool) -> String {
    let setup_name = if trend_stacked {
        "Trend Continuation"
    } else {
        "Unknown Setup"
    };
    let (trigger, entry, mid, full, stop) = match direction {
        Direction::Bullish => (
            "Call Trigger (+23.6%)",
            "Blue bias candle bouncing off 21 EMA",
            "Mid-Range (+61.8%)",
            "Full Range (+100%)",
            "Candle close below 21 EMA or Ribbon fold",
        ),
        Direction::Bearish => (
            "Put Trigger (-23.6%)",
            "Orange bias candle failing at 21 EMA",
            "Mid-Range (-61.8%)",
            "Full Range (-100%)",
            "Candle close above 21 EMA or Ribbon fold",
        ),
    };

    format!(
        "Setup: {} ({}). Trigger: {} cleared. Entry: {}. Exit: Scale 70% at {}, runners to {}. Stop: {}.",
        setup_name, direction, trigger, entry, mid, full, stop
    )
}

fn near(level: f64, reference: Option<f64>) -> bool {
    match reference {
        Some(r) if r > 0.0 => (level - r).abs() / r < CONFLUENCE_TOLERANCE,
        _ => false,
    }
}

/// Score a setup from the four component results.
///
/// `mtf_ribbons` maps a timeframe label to a ribbon computed on that
/// timeframe. When it is absent or empty, the 200 EMA side of the main
/// ribbon stands in for multi-timeframe alignment.
pub fn green_flag_checklist(
    atr: &AtrLevels,
    ribbon: &PivotRibbon,
    phase: &PhaseOscillator,
    structure: &PriceStructure,
    direction: Direction,
    vix: Option<f64>,
    mtf_ribbons: Option<&BTreeMap<String, PivotRibbon>>,
) -> GreenFlagChecklist {
    let bullish = direction.is_bullish();
    let price = atr.current_price;
    let target_state = if bullish {
        RibbonState::Bullish
    } else {
        RibbonState::Bearish
    };

    let mtf_aligned = match mtf_ribbons {
        Some(ribbons) if !ribbons.is_empty() => {
            ribbons.values().all(|r| r.ribbon_state == target_state)
        }
        _ => ribbon.above_200ema == bullish,
    };

    let momentum_phase = if bullish { Phase::Green } else { Phase::Red };

    let flags = ChecklistFlags {
        direction,
        trend_ribbon_stacked: ribbon.ribbon_state == target_state,
        price_vs_cloud: if bullish {
            price > ribbon.ema48
        } else {
            price < ribbon.ema48
        },
        trigger_hit: if bullish {
            price >= atr.call_trigger
        } else {
            price <= atr.put_trigger
        },
        structure_confirmed: if bullish {
            structure.broke_above()
        } else {
            structure.broke_below()
        },
        mtf_aligned,
        momentum_confirmed: phase.phase == momentum_phase,
        squeeze: phase.in_compression,
        atr_room_ok: atr.atr_room_ok,
        vix_bias: vix.map(|v| {
            if bullish {
                v < VIX_BULLISH_BELOW
            } else {
                v > VIX_BEARISH_ABOVE
            }
        }),
        confluence_bonus: if bullish {
            near(atr.call_trigger, structure.pdh())
        } else {
            near(atr.put_trigger, structure.pdl())
        },
    };

    let score = flags.score();
    let grade = Grade::from_score(score);

    tracing::debug!("Green flag checklist: {} score={} grade={}", direction, score, grade.as_str());

    GreenFlagChecklist {
        direction,
        score,
        max_score: MAX_SCORE,
        grade,
        recommendation: grade.recommendation().to_string(),
        flags,
        verbal_audit: verbal_audit(direction, flags.trend_ribbon_stacked),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atr_levels::{AtrStatus, PricePosition, TrendLabel, TriggerBox};
    use crate::phase_oscillator::{Zone, ZoneCrosses, ZoneLines};
    use crate::pivot_ribbon::{BiasCandle, BiasSignal};
    use crate::price_structure::{GapScenario, StructuralBias, StructureLevels};
    use analysis_core::TradingMode;

    fn atr(price: f64, room_ok: bool) -> AtrLevels {
        AtrLevels {
            atr: 2.0,
            pdc: 100.0,
            current_price: price,
            levels: Default::default(),
            call_trigger: 100.472,
            put_trigger: 99.528,
            trigger_box: TriggerBox { low: 99.528, high: 100.472, inside: false },
            price_position: PricePosition::AboveCallTrigger,
            daily_range: 1.0,
            period_range: 1.0,
            atr_covered_pct: 50.0,
            atr_status: if room_ok { AtrStatus::Green } else { AtrStatus::Red },
            atr_room_ok: room_ok,
            chopzilla: false,
            trend: TrendLabel::Bullish,
            trading_mode: TradingMode::Day,
            trading_mode_label: "Day".to_string(),
            use_current_close: false,
        }
    }

    fn ribbon(state: RibbonState, ema48: f64, above_200: bool) -> PivotRibbon {
        PivotRibbon {
            ema8: 101.0,
            ema13: 100.5,
            ema21: 100.0,
            ema48,
            ema200: 90.0,
            ribbon_state: state,
            bias_candle: BiasCandle::Green,
            bias_signal: BiasSignal::Bullish,
            conviction_arrow: None,
            spread: 1.0,
            above_48ema: true,
            above_200ema: above_200,
            in_compression: false,
            chopzilla: state == RibbonState::Chopzilla,
        }
    }

    fn phase(phase: Phase, in_compression: bool) -> PhaseOscillator {
        PhaseOscillator {
            oscillator: 30.0,
            oscillator_prev: 25.0,
            phase,
            in_compression,
            current_zone: Zone::NeutralUp,
            zone_crosses: ZoneCrosses::default(),
            zones: ZoneLines::default(),
        }
    }

    fn structure(pdh: f64, pdl: f64, above_pdh: bool, below_pdl: bool) -> PriceStructure {
        PriceStructure::Levels(StructureLevels {
            pdc: 100.0,
            pdh,
            pdl,
            current_price: 101.0,
            pmh: None,
            pml: None,
            structural_bias: StructuralBias::Neutral,
            gap_scenario: GapScenario::NoGap,
            price_above_pdh: above_pdh,
            price_above_pmh: false,
            price_below_pdl: below_pdl,
            price_below_pml: false,
        })
    }

    #[test]
    fn test_all_flags_true_bullish_is_a_plus() {
        let result = green_flag_checklist(
            &atr(101.0, true),
            &ribbon(RibbonState::Bullish, 99.0, true),
            &phase(Phase::Green, true),
            &structure(100.5, 98.0, true, false),
            Direction::Bullish,
            Some(14.0),
            None,
        );
        assert_eq!(result.score, 10);
        assert_eq!(result.grade, Grade::APlus);
        assert_eq!(result.max_score, MAX_SCORE);
        assert_eq!(result.recommendation, Grade::APlus.recommendation());
        assert!(result.verbal_audit.starts_with("Setup: Trend Continuation (bullish)."));
    }

    #[test]
    fn test_vix_absent_is_null_and_not_counted() {
        let result = green_flag_checklist(
            &atr(101.0, true),
            &ribbon(RibbonState::Bullish, 99.0, true),
            &phase(Phase::Green, true),
            &structure(100.5, 98.0, true, false),
            Direction::Bullish,
            None,
            None,
        );
        assert_eq!(result.flags.vix_bias, None);
        assert_eq!(result.score, 9);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json["flags"]["vix_bias"].is_null());
        assert_eq!(json["flags"].as_object().unwrap().len(), 10);
        assert_eq!(json["grade"], "A+");
    }

    #[test]
    fn test_vix_thresholds() {
        let run = |direction, vix| {
            green_flag_checklist(
                &atr(101.0, true),
                &ribbon(RibbonState::Bullish, 99.0, true),
                &phase(Phase::Green, false),
                &structure(100.5, 98.0, false, false),
                direction,
                Some(vix),
                None,
            )
            .flags
            .vix_bias
        };
        assert_eq!(run(Direction::Bullish, 16.9), Some(true));
        assert_eq!(run(Direction::Bullish, 17.0), Some(false));
        assert_eq!(run(Direction::Bearish, 20.0), Some(false));
        assert_eq!(run(Direction::Bearish, 20.1), Some(true));
    }

    #[test]
    fn test_bearish_mirrors_flags() {
        let result = green_flag_checklist(
            &atr(99.0, false),
            &ribbon(RibbonState::Bearish, 100.0, false),
            &phase(Phase::Red, false),
            &structure(103.0, 99.7, false, true),
            Direction::Bearish,
            Some(25.0),
            None,
        );
        let flags = result.flags;
        assert!(flags.trend_ribbon_stacked);
        assert!(flags.price_vs_cloud);
        assert!(flags.trigger_hit);
        assert!(flags.structure_confirmed);
        assert!(flags.mtf_aligned);
        assert!(flags.momentum_confirmed);
        assert!(!flags.squeeze);
        assert!(!flags.atr_room_ok);
        assert_eq!(flags.vix_bias, Some(true));
        // |99.528 - 99.7| / 99.7 < 0.5%
        assert!(flags.confluence_bonus);
        assert_eq!(result.score, 8);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["flags"]["price_below_cloud"], true);
        assert!(json["flags"].get("price_above_cloud").is_none());
        assert_eq!(json["direction"], "bearish");
    }

    #[test]
    fn test_mtf_ribbons_override_200ema_fallback() {
        let main = ribbon(RibbonState::Bullish, 99.0, false);
        let mut mtf = BTreeMap::new();
        mtf.insert("1h".to_string(), ribbon(RibbonState::Bullish, 99.0, true));
        mtf.insert("1d".to_string(), ribbon(RibbonState::Bullish, 99.0, true));

        let run = |mtf: Option<&BTreeMap<String, PivotRibbon>>| {
            green_flag_checklist(
                &atr(101.0, true),
                &main,
                &phase(Phase::Green, false),
                &structure(110.0, 90.0, false, false),
                Direction::Bullish,
                None,
                mtf,
            )
            .flags
            .mtf_aligned
        };

        assert!(run(Some(&mtf)));
        // fallback: main ribbon is below the 200 EMA
        assert!(!run(None));
        assert!(!run(Some(&BTreeMap::new())));

        mtf.insert("1w".to_string(), ribbon(RibbonState::Chopzilla, 99.0, true));
        assert!(!run(Some(&mtf)));
    }

    #[test]
    fn test_unavailable_structure_scores_false() {
        let result = green_flag_checklist(
            &atr(101.0, true),
            &ribbon(RibbonState::Bullish, 99.0, true),
            &phase(Phase::Green, false),
            &PriceStructure::Unavailable { error: "short".to_string() },
            Direction::Bullish,
            None,
            None,
        );
        assert!(!result.flags.structure_confirmed);
        assert!(!result.flags.confluence_bonus);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(10), Grade::APlus);
        assert_eq!(Grade::from_score(5), Grade::APlus);
        assert_eq!(Grade::from_score(4), Grade::A);
        assert_eq!(Grade::from_score(3), Grade::B);
        assert_eq!(Grade::from_score(2), Grade::Skip);
        assert_eq!(Grade::from_score(0), Grade::Skip);
        assert!(Grade::APlus < Grade::A && Grade::B < Grade::Skip);
        assert_eq!(serde_json::to_string(&Grade::Skip).unwrap(), "\"skip\"");
        assert_eq!(
            Grade::Skip.recommendation(),
            "Insufficient confirmations. WAIT — do not force the trade."
        );
    }

    #[test]
    fn test_verbal_audit_templates() {
        assert_eq!(
            verbal_audit(Direction::Bullish, true),
            "Setup: Trend Continuation (bullish). Trigger: Call Trigger (+23.6%) cleared. \
             Entry: Blue bias candle bouncing off 21 EMA. Exit: Scale 70% at Mid-Range (+61.8%), \
             runners to Full Range (+100%). Stop: Candle close below 21 EMA or Ribbon fold."
        );
        let bear = verbal_audit(Direction::Bearish, false);
        assert!(bear.starts_with("Setup: Unknown Setup (bearish). Trigger: Put Trigger (-23.6%) cleared."));
        assert!(bear.ends_with("Stop: Candle close above 21 EMA or Ribbon fold."));
    }
}
