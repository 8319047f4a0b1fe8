//! Number and time formatting for dashboard panels.

use std::fmt;

use chrono::{DateTime, Local, Utc};

/// `$1000.50`, `-$12.30`. Two decimals, no grouping.
pub fn currency(value: f64) -> String {
    let cents = (value * 100.0).round();
    if cents < 0.0 {
        format!("-${:.2}", -cents / 100.0)
    } else {
        format!("${:.2}", cents.abs() / 100.0)
    }
}

/// `12.34%`
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// `+1.23%` or `-1.23%`; zero counts as positive.
pub fn signed_percent(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.2}%", value)
    } else {
        format!("{:.2}%", value)
    }
}

/// 24h volume in millions: `$12.3M`.
pub fn volume_millions(value: f64) -> String {
    format!("${:.1}M", value / 1_000_000.0)
}

/// Quantities as sent by the exchange, without trailing zeros: `0.5`, `12`.
pub fn quantity(value: f64) -> String {
    let text = format!("{:.8}", value);
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Local wall-clock time, `HH:MM:SS`.
pub fn clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Margin usage bands: above 80% is critical, above 60% elevated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginLevel {
    Healthy,
    Elevated,
    Critical,
}

impl MarginLevel {
    pub fn classify(ratio: f64) -> Self {
        if ratio > 80.0 {
            MarginLevel::Critical
        } else if ratio > 60.0 {
            MarginLevel::Elevated
        } else {
            MarginLevel::Healthy
        }
    }
}

impl fmt::Display for MarginLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginLevel::Healthy => write!(f, "healthy"),
            MarginLevel::Elevated => write!(f, "elevated"),
            MarginLevel::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnlTone {
    Gain,
    Loss,
}

impl PnlTone {
    pub fn of(value: f64) -> Self {
        if value >= 0.0 { PnlTone::Gain } else { PnlTone::Loss }
    }

    pub fn marker(&self) -> char {
        match self {
            PnlTone::Gain => '▲',
            PnlTone::Loss => '▼',
        }
    }
}

const SPARK_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One bar per value, scaled between the series minimum and maximum.
pub fn sparkline(values: &[f64]) -> String {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        return String::new();
    }

    let span = max - min;
    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                ' '
            } else if span == 0.0 {
                SPARK_BARS[SPARK_BARS.len() / 2]
            } else {
                let scaled = ((v - min) / span * (SPARK_BARS.len() - 1) as f64).round();
                SPARK_BARS[scaled as usize]
            }
        })
        .collect()
}
