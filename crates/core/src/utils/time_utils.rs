use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar season used to look up seasonal fee adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Holiday,
    Winter,
}

impl Season {
    /// Spring is February-April, Summer May-July, Fall August-October and
    /// Holiday November-January. No month maps to Winter on its own; its
    /// adjustment is the fallback for Holiday sales.
    pub fn for_date(date: NaiveDate) -> Self {
        match date.month() {
            2..=4 => Season::Spring,
            5..=7 => Season::Summer,
            8..=10 => Season::Fall,
            11 | 12 | 1 => Season::Holiday,
            _ => Season::Winter,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Holiday => "Holiday",
            Season::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporting period bucket (`YYYY-MM`) for a transaction date.
pub fn period_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}
