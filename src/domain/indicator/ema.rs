//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first observation, then EMA[i] = x[i]*k + EMA[i-1]*(1-k).
//! The recursion runs from the first bar; the first (n-1) outputs are marked
//! invalid so that the warm-up matches a span-n EMA with min_periods = n.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

/// Raw EMA recursion over a plain slice. Output has the same length as `values`.
pub fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = 0.0;

    for (i, &x) in values.iter().enumerate() {
        ema = if i == 0 { x } else { x * k + ema * (1.0 - k) };
        out.push(ema);
    }

    out
}

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(period),
            values: Vec::new(),
        };
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values = ema_values(&closes, period)
        .into_iter()
        .zip(bars)
        .enumerate()
        .map(|(i, (ema, bar))| IndicatorPoint {
            timestamp: bar.timestamp,
            valid: i + 1 >= period,
            value: IndicatorValue::Simple(ema),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}
