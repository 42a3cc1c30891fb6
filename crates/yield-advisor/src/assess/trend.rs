//! 7-day APY trend classification

use crate::config::TrendThresholds;
use crate::model::{Trend, TrendReading};

/// Label a 7-day percent change. Absent change reads as stable.
pub fn classify_trend(change_7d: Option<f64>, thresholds: &TrendThresholds) -> TrendReading {
    let label = match change_7d {
        Some(change) if change > thresholds.up_above => Trend::Up,
        Some(change) if change < thresholds.down_below => Trend::Down,
        _ => Trend::Stable,
    };

    TrendReading {
        label,
        change: change_7d,
    }
}
