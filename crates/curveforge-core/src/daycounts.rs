//! Day count conventions.
//!
//! Year fractions are returned as `f64`: the calibration pipeline is
//! floating-point end to end, so accrual factors enter the solver directly.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Date;

/// Day count convention for accrual-factor calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DayCount {
    /// Actual/360: money market instruments, USD/EUR floating legs.
    Act360,
    /// Actual/365 Fixed: GBP money markets and the curve time axis.
    #[default]
    Act365Fixed,
    /// 30/360 US (bond basis): USD fixed swap legs.
    Thirty360,
}

impl DayCount {
    /// Year fraction between two dates under this convention.
    #[must_use]
    pub fn year_fraction(&self, start: Date, end: Date) -> f64 {
        match self {
            DayCount::Act360 => start.days_between(&end) as f64 / 360.0,
            DayCount::Act365Fixed => start.days_between(&end) as f64 / 365.0,
            DayCount::Thirty360 => {
                let d1 = start.day().min(30);
                // 30/360 US: roll end-of-month day 31 back only if start >= 30
                let d2 = if end.day() == 31 && d1 == 30 { 30 } else { end.day() };
                let days = 360 * (end.year() - start.year())
                    + 30 * (end.month() as i32 - start.month() as i32)
                    + (d2 as i32 - d1 as i32);
                f64::from(days) / 360.0
            }
        }
    }
}

impl fmt::Display for DayCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayCount::Act360 => "ACT/360",
            DayCount::Act365Fixed => "ACT/365F",
            DayCount::Thirty360 => "30/360",
        };
        write!(f, "{name}")
    }
}
