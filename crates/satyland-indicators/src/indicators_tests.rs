#[cfg(test)]
mod tests {
    use super::super::indicators::*;
    use analysis_core::Bar;
    use chrono::{Duration, TimeZone, Utc};

    // Helper function to create sample price data
    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
            46.21, 46.25, 45.71, 46.45,
        ]
    }

    // Helper function to create sample bars
    fn sample_bars() -> Vec<Bar> {
        let prices = vec![
            (100.0, 102.0, 99.0, 101.0),
            (101.0, 103.0, 100.0, 102.0),
            (102.0, 104.0, 101.0, 103.0),
            (103.0, 105.0, 102.0, 104.0),
            (104.0, 106.0, 103.0, 105.0),
            (105.0, 107.0, 104.0, 106.0),
            (106.0, 108.0, 105.0, 107.0),
            (107.0, 109.0, 106.0, 108.0),
            (108.0, 110.0, 107.0, 109.0),
            (109.0, 111.0, 108.0, 110.0),
        ];

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        prices
            .into_iter()
            .enumerate()
            .map(|(i, (open, high, low, close))| Bar {
                timestamp: start + Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000000.0,
            })
            .collect()
    }

    #[test]
    fn test_ema_seeded_at_first_value() {
        let data = vec![22.0, 24.0, 23.0, 25.0, 26.0];
        let result = ema(&data, 3);

        assert_eq!(result.len(), data.len());
        assert_eq!(result[0], 22.0);
        // alpha = 0.5
        assert!((result[1] - 23.0).abs() < 1e-12);
        assert!((result[2] - 23.0).abs() < 1e-12);
        assert!((result[3] - 24.0).abs() < 1e-12);
        assert!((result[4] - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_ema_empty_data() {
        let data: Vec<f64> = vec![];
        assert!(ema(&data, 5).is_empty());
        assert!(ema(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn test_ema_increases_with_uptrend() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let result = ema(&data, 3);

        for i in 1..result.len() {
            assert!(result[i] > result[i - 1]);
        }
    }

    #[test]
    fn test_shorter_span_tracks_price_closer() {
        let prices = sample_prices();
        let fast = last_ema(&prices, 3);
        let slow = last_ema(&prices, 21);
        let last = *prices.last().unwrap();
        assert!((last - fast).abs() <= (last - slow).abs());
    }

    #[test]
    fn test_true_range_first_bar_is_high_low() {
        let bars = sample_bars();
        let tr = true_range(&bars);

        assert_eq!(tr.len(), bars.len());
        assert!((tr[0] - 3.0).abs() < 1e-12);
        // bar 1: max(3, |103-101|, |100-101|) = 3
        assert!((tr[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_true_range_uses_gap_from_previous_close() {
        let mut bars = sample_bars();
        bars[1].high = 110.0;
        bars[1].low = 109.0;
        let tr = true_range(&bars);
        // |low - prev close| = 8 does not beat |high - prev close| = 9
        assert!((tr[1] - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_wilder_atr_constant_range() {
        let bars = sample_bars();
        let result = wilder_atr(&bars, 14);

        assert_eq!(result.len(), bars.len());
        for &value in &result {
            assert!((value - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_wilder_atr_recursion() {
        let mut bars = sample_bars();
        bars[2].high = 109.0; // TR[2] = 109 - 101 = 8
        let result = wilder_atr(&bars, 14);

        let expected = 3.0 + (8.0 - 3.0) / 14.0;
        assert!((result[2] - expected).abs() < 1e-12);
        assert!(result[3] < result[2]);
    }

    #[test]
    fn test_wilder_atr_zero_period() {
        assert!(wilder_atr(&sample_bars(), 0).is_empty());
    }

    #[test]
    fn test_rolling_std_window() {
        let prices = sample_prices();
        let result = rolling_std(&prices, 21);

        assert_eq!(result.len(), prices.len());
        assert!(result[..20].iter().all(|v| v.is_none()));
        assert!(result[20..].iter().all(|v| v.is_some()));

        let window = &prices[3..24];
        let m = window.iter().sum::<f64>() / 21.0;
        let var = window.iter().map(|x| (x - m).powi(2)).sum::<f64>() / 20.0;
        assert!((result[23].unwrap() - var.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_std_constant_prices() {
        let prices = vec![100.0; 30];
        let result = rolling_std(&prices, 21);
        assert!(result.iter().flatten().all(|&sd| sd.abs() < 1e-12));
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(100.47200000001), 100.472);
        assert_eq!(round4(99.52799999), 99.528);
    }

    #[test]
    fn test_round4_uses_exact_decimal_value() {
        assert_eq!(round4(52.44085), 52.4408);
        // exact binary ties go to even
        assert_eq!(round4(1.03125), 1.0312);
        assert_eq!(round4(1.09375), 1.0938);
    }
}
