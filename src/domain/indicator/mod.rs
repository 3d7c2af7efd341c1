//! Technical indicator engine.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values
//! - `IndicatorSnapshot`: The aligned DIF/DEA/K/D/J/ATR sequences consumed by strategies
//!
//! `compute_snapshot` is the entry point: it runs MACD, KDJ and ATR over the
//! same bars, trims every series to the first index where all of them are
//! valid, and fails with `InsufficientData` when fewer than two aligned points
//! remain.

pub mod atr;
pub mod ema;
pub mod kdj;
pub mod macd;

use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::error::SignalError;
use crate::domain::ohlcv::OhlcvBar;

pub use atr::calculate_atr;
pub use ema::{calculate_ema, ema_values};
pub use kdj::calculate_kdj;
pub use macd::calculate_macd;

/// Crossover detection looks at index -1 and -2.
pub const MIN_SNAPSHOT_POINTS: usize = 2;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub timestamp: DateTime<Utc>,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd { dif: f64, dea: f64, histogram: f64 },
    Kdj { k: f64, d: f64, j: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Atr(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Kdj {
        period: usize,
        k_smooth: usize,
        d_smooth: usize,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Index of the first valid point, if any.
    pub fn first_valid(&self) -> Option<usize> {
        self.values.iter().position(|p| p.valid)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Kdj {
                period,
                k_smooth,
                d_smooth,
            } => write!(f, "KDJ({},{},{})", period, k_smooth, d_smooth),
        }
    }
}

/// Window lengths for the indicator engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorParams {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub kdj_period: usize,
    pub kdj_k_smooth: usize,
    pub kdj_d_smooth: usize,
    pub atr_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            kdj_period: kdj::DEFAULT_PERIOD,
            kdj_k_smooth: kdj::DEFAULT_SMOOTH,
            kdj_d_smooth: kdj::DEFAULT_SMOOTH,
            atr_window: atr::DEFAULT_WINDOW,
        }
    }
}

impl IndicatorParams {
    /// Number of leading bars that are warm-up in at least one series.
    pub fn warmup(&self) -> usize {
        let macd = self.macd_slow.max(self.macd_fast).saturating_sub(1)
            + self.macd_signal.saturating_sub(1);
        let kdj = self.kdj_period.saturating_sub(1);
        let atr = self.atr_window.saturating_sub(1);
        macd.max(kdj).max(atr)
    }

    /// Minimum number of bars that yields a usable snapshot.
    pub fn required_bars(&self) -> usize {
        self.warmup() + MIN_SNAPSHOT_POINTS
    }
}

/// Aligned indicator sequences, oldest first. Every vector has the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub timestamps: Vec<DateTime<Utc>>,
    pub dif: Vec<f64>,
    pub dea: Vec<f64>,
    pub k: Vec<f64>,
    pub d: Vec<f64>,
    pub j: Vec<f64>,
    pub atr: Vec<f64>,
}

fn last_two(series: &[f64]) -> Option<(f64, f64)> {
    match series {
        [.., prev, last] => Some((*prev, *last)),
        _ => None,
    }
}

impl IndicatorSnapshot {
    pub fn len(&self) -> usize {
        self.dif.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dif.is_empty()
    }

    /// True when the five trend/oscillator series each hold at least two
    /// points and agree on length. ATR is checked separately by its consumers.
    pub fn is_sufficient(&self) -> bool {
        let n = self.dif.len();
        n >= MIN_SNAPSHOT_POINTS
            && self.dea.len() == n
            && self.k.len() == n
            && self.d.len() == n
            && self.j.len() == n
    }

    /// DIF crossed above DEA on the last point.
    pub fn trend_golden_cross(&self) -> bool {
        match (last_two(&self.dif), last_two(&self.dea)) {
            (Some((dif_prev, dif)), Some((dea_prev, dea))) => dif_prev < dea_prev && dif > dea,
            _ => false,
        }
    }

    /// DIF crossed below DEA on the last point.
    pub fn trend_death_cross(&self) -> bool {
        match (last_two(&self.dif), last_two(&self.dea)) {
            (Some((dif_prev, dif)), Some((dea_prev, dea))) => dif_prev > dea_prev && dif < dea,
            _ => false,
        }
    }

    /// K crossed above D on the last point.
    pub fn kdj_golden_cross(&self) -> bool {
        match (last_two(&self.k), last_two(&self.d)) {
            (Some((k_prev, k)), Some((d_prev, d))) => k_prev < d_prev && k > d,
            _ => false,
        }
    }

    pub fn last_j(&self) -> Option<f64> {
        self.j.last().copied()
    }

    pub fn last_atr(&self) -> Option<f64> {
        self.atr.last().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }
}

fn simple_values(series: &IndicatorSeries) -> impl Iterator<Item = f64> + '_ {
    series.values.iter().map(|p| match p.value {
        IndicatorValue::Simple(v) => v,
        _ => f64::NAN,
    })
}

/// Compute the aligned DIF/DEA/K/D/J/ATR snapshot for `bars` (oldest first).
pub fn compute_snapshot(
    symbol: &str,
    bars: &[OhlcvBar],
    params: &IndicatorParams,
) -> Result<IndicatorSnapshot, SignalError> {
    if let Some(bad) = bars.iter().find(|b| !b.is_finite()) {
        return Err(SignalError::FeedUnavailable {
            symbol: symbol.to_string(),
            reason: format!("non-finite bar at {}", bad.timestamp),
        });
    }

    let insufficient = |have: usize| SignalError::InsufficientData {
        symbol: symbol.to_string(),
        have,
        need: MIN_SNAPSHOT_POINTS,
    };

    let macd = calculate_macd(bars, params.macd_fast, params.macd_slow, params.macd_signal);
    let kdj = calculate_kdj(bars, params.kdj_period, params.kdj_k_smooth, params.kdj_d_smooth);
    let atr = calculate_atr(bars, params.atr_window);

    let start = match (macd.first_valid(), kdj.first_valid(), atr.first_valid()) {
        (Some(m), Some(k), Some(a)) => m.max(k).max(a),
        _ => return Err(insufficient(0)),
    };

    let points = bars.len() - start;
    if points < MIN_SNAPSHOT_POINTS {
        return Err(insufficient(points));
    }

    let mut snapshot = IndicatorSnapshot {
        timestamps: bars[start..].iter().map(|b| b.timestamp).collect(),
        atr: simple_values(&atr).skip(start).collect(),
        ..IndicatorSnapshot::default()
    };

    for point in &macd.values[start..] {
        if let IndicatorValue::Macd { dif, dea, .. } = point.value {
            snapshot.dif.push(dif);
            snapshot.dea.push(dea);
        }
    }
    for point in &kdj.values[start..] {
        if let IndicatorValue::Kdj { k, d, j } = point.value {
            snapshot.k.push(k);
            snapshot.d.push(d);
            snapshot.j.push(j);
        }
    }

    if !snapshot.is_sufficient() || snapshot.atr.len() != snapshot.len() {
        return Err(insufficient(snapshot.len()));
    }

    Ok(snapshot)
}
