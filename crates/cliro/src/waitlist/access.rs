use chrono::{Days, NaiveDate};
use serde::{Serialize, Serializer};

/// Positions up to this rank get access right away.
pub const IMMEDIATE_CUTOFF: u64 = 100;
/// Last position served by the daily tier (10 signups per day).
pub const DAILY_TIER_END: u64 = 500;

const SIGNUPS_PER_DAY: u64 = 10;
const SIGNUPS_PER_WEEK: u64 = 100;

/// Non-binding estimate of when a waitlist position gets access.
///
/// Ordering follows time: `Immediate` sorts before any date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EstimatedAccess {
    Immediate,
    On(NaiveDate),
}

impl EstimatedAccess {
    /// Three-tier schedule: immediate up to 100, then whole days at 10 per day, then whole
    /// weeks at 100 per week. The weekly tier starts where the daily tier ends so a later
    /// position never gets an earlier date.
    pub fn for_position(position: u64, today: NaiveDate) -> Self {
        if position <= IMMEDIATE_CUTOFF {
            return EstimatedAccess::Immediate;
        }

        let days = if position <= DAILY_TIER_END {
            daily_tier_days(position)
        } else {
            let weeks = ((position - DAILY_TIER_END) / SIGNUPS_PER_WEEK).max(1);
            daily_tier_days(DAILY_TIER_END).saturating_add(weeks.saturating_mul(7))
        };

        EstimatedAccess::On(
            today
                .checked_add_days(Days::new(days))
                .unwrap_or(NaiveDate::MAX),
        )
    }

    pub fn label(&self) -> String {
        match self {
            EstimatedAccess::Immediate => "Immediate".to_string(),
            EstimatedAccess::On(date) => date.format("%d/%m/%Y").to_string(),
        }
    }
}

fn daily_tier_days(position: u64) -> u64 {
    ((position - IMMEDIATE_CUTOFF) / SIGNUPS_PER_DAY).max(1)
}

impl std::fmt::Display for EstimatedAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for EstimatedAccess {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}
