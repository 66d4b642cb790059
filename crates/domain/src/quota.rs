//! Free-tier quota periods and the quota decision rule.

use chrono::{Datelike, Months, NaiveDate};
use shiftledger_core::{AppError, AppResult};

use crate::Subscription;

/// Inclusive calendar window over which free-tier creations are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl QuotaPeriod {
    /// Returns the calendar month containing the given reference date.
    ///
    /// The window is derived from the record's own date, so back-dated
    /// entries are counted against the month they belong to.
    #[must_use]
    pub fn containing(reference_date: NaiveDate) -> Self {
        let start = reference_date.with_day(1).unwrap_or(reference_date);
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next_month| next_month.pred_opt())
            .unwrap_or(NaiveDate::MAX);

        Self { start, end }
    }

    /// Returns the first day of the period.
    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Returns the last day of the period (inclusive).
    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns whether a date falls inside the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Outcome of a quota evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// The creation may proceed.
    Allow,
    /// The free-tier limit is reached.
    Reject {
        /// Configured limit.
        limit: u32,
        /// Records already counted in the period.
        current: u32,
    },
}

impl QuotaDecision {
    /// Converts a rejection into [`AppError::QuotaExceeded`].
    pub fn into_result(self) -> AppResult<()> {
        match self {
            Self::Allow => Ok(()),
            Self::Reject { limit, current } => Err(AppError::QuotaExceeded { limit, current }),
        }
    }
}

/// Decides whether one more record may be created in the current period.
///
/// Paid and trialing subscriptions are unlimited. Free subscriptions are
/// allowed while `current_count < limit`. The function is pure; callers are
/// responsible for counting under the tenant's subscription lock.
#[must_use]
pub fn evaluate_quota(subscription: &Subscription, current_count: u32, limit: u32) -> QuotaDecision {
    if !subscription.is_free() {
        return QuotaDecision::Allow;
    }

    if current_count < limit {
        QuotaDecision::Allow
    } else {
        QuotaDecision::Reject {
            limit,
            current: current_count,
        }
    }
}
