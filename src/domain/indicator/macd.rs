//! MACD (DIF/DEA) indicator.
//!
//! DIF = EMA(fast) - EMA(slow) of close
//! DEA = EMA(signal) of DIF, started at the first valid DIF
//! Histogram = DIF - DEA
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: max(fast, slow) - 1 + signal - 1 bars

use crate::domain::indicator::{
    ema_values, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };

    if bars.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);

    let dif: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();

    let dif_warmup = fast.max(slow) - 1;
    let signal_warmup = dif_warmup + signal_period - 1;

    let mut dea = vec![0.0; bars.len()];
    if bars.len() > dif_warmup {
        let tail = ema_values(&dif[dif_warmup..], signal_period);
        dea[dif_warmup..].copy_from_slice(&tail);
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorPoint {
            timestamp: bar.timestamp,
            valid: i >= signal_warmup,
            value: IndicatorValue::Macd {
                dif: dif[i],
                dea: dea[i],
                histogram: dif[i] - dea[i],
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}
