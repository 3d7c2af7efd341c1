//! KDJ stochastic oscillator.
//!
//! RSV[i] = (C[i] - min(L, n)) / (max(H, n) - min(L, n)) * 100
//! K[i] = (1 - 1/k_smooth) * K[i-1] + (1/k_smooth) * RSV[i]
//! D[i] = (1 - 1/d_smooth) * D[i-1] + (1/d_smooth) * K[i]
//! J[i] = 3K[i] - 2D[i]
//!
//! K and D are seeded with RSV at the first full window (index n-1). A flat
//! window (max == min) carries the previous RSV forward, or 50 if there is none.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 9;
pub const DEFAULT_SMOOTH: usize = 3;

const NEUTRAL_RSV: f64 = 50.0;

pub fn calculate_kdj(
    bars: &[OhlcvBar],
    period: usize,
    k_smooth: usize,
    d_smooth: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Kdj {
        period,
        k_smooth,
        d_smooth,
    };

    if period == 0 || k_smooth == 0 || d_smooth == 0 || bars.is_empty() {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let k_alpha = 1.0 / k_smooth as f64;
    let d_alpha = 1.0 / d_smooth as f64;

    let mut values = Vec::with_capacity(bars.len());
    let mut prev: Option<(f64, f64, f64)> = None;

    for (i, bar) in bars.iter().enumerate() {
        if i + 1 < period {
            values.push(IndicatorPoint {
                timestamp: bar.timestamp,
                valid: false,
                value: IndicatorValue::Kdj {
                    k: 0.0,
                    d: 0.0,
                    j: 0.0,
                },
            });
            continue;
        }

        let window = &bars[i + 1 - period..=i];
        let low_min = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let high_max = window
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let range = high_max - low_min;

        let rsv = if range > 0.0 {
            ((bar.close - low_min) / range * 100.0).clamp(0.0, 100.0)
        } else {
            prev.map(|(rsv, _, _)| rsv).unwrap_or(NEUTRAL_RSV)
        };

        let (k, d) = match prev {
            None => (rsv, rsv),
            Some((_, k_prev, d_prev)) => {
                let k = (1.0 - k_alpha) * k_prev + k_alpha * rsv;
                let d = (1.0 - d_alpha) * d_prev + d_alpha * k;
                (k, d)
            }
        };
        prev = Some((rsv, k, d));

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid: true,
            value: IndicatorValue::Kdj {
                k,
                d,
                j: 3.0 * k - 2.0 * d,
            },
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    /// Bars with high == low == close, so the window extremes come from closes.
    fn flat_bars(closes: &[f64]) -> Vec<OhlcvBar> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                timestamp: start + Duration::hours(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
            })
            .collect()
    }

    fn kdj_at(series: &IndicatorSeries, i: usize) -> (f64, f64, f64) {
        match series.values[i].value {
            IndicatorValue::Kdj { k, d, j } => (k, d, j),
            _ => panic!("Expected Kdj value"),
        }
    }

    #[test]
    fn kdj_warmup() {
        let series = calculate_kdj(&flat_bars(&[1.0, 2.0, 3.0, 4.0]), 3, 3, 3);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
    }

    #[test]
    fn kdj_reference_values() {
        let closes = [10.0, 12.0, 11.0, 13.0, 15.0, 14.0, 16.0, 18.0, 17.0, 19.0];
        let series = calculate_kdj(&flat_bars(&closes), 3, 3, 3);

        // i=2: window [10,12,11] → RSV 50, seed K=D=50.
        let (k, d, j) = kdj_at(&series, 2);
        assert_relative_eq!(k, 50.0);
        assert_relative_eq!(d, 50.0);
        assert_relative_eq!(j, 50.0);

        // i=3: window [12,11,13] → RSV 100.
        let (k, d, j) = kdj_at(&series, 3);
        assert_relative_eq!(k, 200.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(d, 500.0 / 9.0, epsilon = 1e-9);
        assert_relative_eq!(j, 800.0 / 9.0, epsilon = 1e-9);

        // i=4: window [11,13,15] → RSV 100.
        let (k, d, j) = kdj_at(&series, 4);
        assert_relative_eq!(k, 700.0 / 9.0, epsilon = 1e-9);
        assert_relative_eq!(d, 1700.0 / 27.0, epsilon = 1e-9);
        assert_relative_eq!(j, 2900.0 / 27.0, epsilon = 1e-9);

        // i=5: window [13,15,14] → RSV 50.
        let k_prev = 700.0 / 9.0;
        let d_prev = 1700.0 / 27.0;
        let k5 = k_prev * 2.0 / 3.0 + 50.0 / 3.0;
        let d5 = d_prev * 2.0 / 3.0 + k5 / 3.0;
        let (k, d, j) = kdj_at(&series, 5);
        assert_relative_eq!(k, k5, epsilon = 1e-9);
        assert_relative_eq!(d, d5, epsilon = 1e-9);
        assert_relative_eq!(j, 3.0 * k5 - 2.0 * d5, epsilon = 1e-9);
    }

    #[test]
    fn kdj_monotonic_rise_saturates_at_100() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let series = calculate_kdj(&flat_bars(&closes), 9, 3, 3);

        for point in series.values.iter().filter(|p| p.valid) {
            if let IndicatorValue::Kdj { k, d, j } = point.value {
                assert_relative_eq!(k, 100.0, epsilon = 1e-9);
                assert_relative_eq!(d, 100.0, epsilon = 1e-9);
                assert_relative_eq!(j, 100.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn kdj_k_and_d_stay_within_rsv_bounds() {
        let closes: Vec<f64> = (0..50)
            .map(|i| 100.0 + ((i * 37) % 11) as f64 - 5.0)
            .collect();
        let series = calculate_kdj(&flat_bars(&closes), 5, 3, 3);
        for point in series.values.iter().filter(|p| p.valid) {
            if let IndicatorValue::Kdj { k, d, .. } = point.value {
                assert!((0.0..=100.0).contains(&k));
                assert!((0.0..=100.0).contains(&d));
            }
        }
    }

    #[test]
    fn kdj_flat_window_forward_fills() {
        // First full window is flat → neutral 50; later flat window repeats last RSV.
        let closes = [5.0, 5.0, 5.0, 8.0, 8.0, 8.0, 8.0];
        let series = calculate_kdj(&flat_bars(&closes), 3, 3, 3);

        let (k, d, _) = kdj_at(&series, 2);
        assert_relative_eq!(k, 50.0);
        assert_relative_eq!(d, 50.0);

        // i=3: window [5,5,8] → RSV 100; i=5: window [8,8,8] flat → RSV stays 100.
        let (k4, _, _) = kdj_at(&series, 4);
        let (k5, _, _) = kdj_at(&series, 5);
        assert!(k5 > k4);
    }

    #[test]
    fn kdj_zero_parameters() {
        let bars = flat_bars(&[1.0, 2.0, 3.0]);
        assert!(calculate_kdj(&bars, 0, 3, 3).values.is_empty());
        assert!(calculate_kdj(&bars, 3, 0, 3).values.is_empty());
        assert!(calculate_kdj(&bars, 3, 3, 0).values.is_empty());
    }

    #[test]
    fn kdj_short_history_is_all_invalid() {
        let series = calculate_kdj(&flat_bars(&[1.0, 2.0]), 9, 3, 3);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}
