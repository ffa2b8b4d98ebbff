//! # Range Aggregation
//!
//! Sums per-day fare breakdowns into `RangeStats`.
//!
//! A child-day is counted only when it carries a stored record or a non-zero
//! total. Since a missing record always charges nothing, only stored records
//! are visited, walking each child's date-ordered map over the window.
//! Records of children that no longer exist are ignored.

use chrono::NaiveDate;
use shared::{Attendance, Child, FareBreakdown, FuturePolicy, PaymentStatus, RangeStats, ReportTotals, StatusBook};

use super::dates::{days_inclusive, month_bounds, weekday_number, year_bounds, DateError};
use super::fare::fare_breakdown;

/// Inclusive date range plus the rule for days after `today`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub future: FuturePolicy,
    pub today: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate, future: FuturePolicy, today: NaiveDate) -> Self {
        Self { start, end, future, today }
    }

    /// Calendar variant: future days count
    pub fn calendar(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Self {
        Self::new(start, end, FuturePolicy::Include, today)
    }

    /// Historical variant: days after today are ignored
    pub fn historical(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Self {
        Self::new(start, end, FuturePolicy::Exclude, today)
    }

    /// Effective inclusive bounds, `None` when nothing can be counted
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let end = match self.future {
            FuturePolicy::Include => self.end,
            FuturePolicy::Exclude => self.end.min(self.today),
        };
        (self.start <= end).then_some((self.start, end))
    }
}

/// Whether a child-day takes part in aggregation
pub fn is_counted(has_record: bool, breakdown: &FareBreakdown) -> bool {
    has_record || breakdown.total > 0
}

/// Accumulate one counted child-day
pub fn record_day(stats: &mut RangeStats, breakdown: &FareBreakdown) {
    stats.total_income = stats.total_income.saturating_add(breakdown.total);
    if breakdown.trip_in {
        stats.trips_in += 1;
    }
    if breakdown.trip_out {
        stats.trips_out += 1;
    }
    match breakdown.pay {
        PaymentStatus::Paid => {
            stats.paid += 1;
            stats.paid_amount = stats.paid_amount.saturating_add(breakdown.total);
        }
        PaymentStatus::Pending => {
            stats.pending += 1;
            stats.pending_amount = stats.pending_amount.saturating_add(breakdown.total);
        }
    }
    match breakdown.att {
        Attendance::Attended => stats.attended += 1,
        Attendance::Absent => stats.absent += 1,
        Attendance::Pending => {}
    }
    stats.days += 1;
}

/// Statistics for a single child over a window
pub fn child_range_stats(child: &Child, statuses: &StatusBook, window: &DateWindow) -> RangeStats {
    let mut stats = RangeStats::default();
    let Some((start, end)) = window.bounds() else {
        return stats;
    };
    let Some(records) = statuses.child_records(&child.id) else {
        return stats;
    };

    for (_, record) in records.range(start..=end) {
        let breakdown = fare_breakdown(Some(child), Some(record));
        if is_counted(true, &breakdown) {
            record_day(&mut stats, &breakdown);
        }
    }
    stats
}

/// Statistics for every child over a window
pub fn range_stats(children: &[Child], statuses: &StatusBook, window: &DateWindow) -> RangeStats {
    children
        .iter()
        .map(|child| child_range_stats(child, statuses, window))
        .fold(RangeStats::default(), |mut total, stats| {
            total += stats;
            total
        })
}

/// Historical statistics for a month
pub fn month_stats(
    children: &[Child],
    statuses: &StatusBook,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<RangeStats, DateError> {
    let (start, end) = month_bounds(year, month)?;
    Ok(range_stats(children, statuses, &DateWindow::historical(start, end, today)))
}

/// Historical statistics for a year
pub fn year_stats(
    children: &[Child],
    statuses: &StatusBook,
    year: i32,
    today: NaiveDate,
) -> Result<RangeStats, DateError> {
    let (start, end) = year_bounds(year)?;
    Ok(range_stats(children, statuses, &DateWindow::historical(start, end, today)))
}

/// Add one scheduled child-day to report totals.
///
/// Unlike `record_day`, days without a record are included; they charge
/// nothing and count as pending.
pub fn record_scheduled_day(totals: &mut ReportTotals, breakdown: &FareBreakdown) {
    totals.days += 1;
    if breakdown.trip_in {
        totals.trips_in += 1;
    }
    if breakdown.trip_out {
        totals.trips_out += 1;
    }
    match breakdown.att {
        Attendance::Attended => totals.attended += 1,
        Attendance::Absent => totals.absent += 1,
        Attendance::Pending => {}
    }
    match breakdown.pay {
        PaymentStatus::Paid => totals.paid = totals.paid.saturating_add(breakdown.total),
        PaymentStatus::Pending => totals.pending = totals.pending.saturating_add(breakdown.total),
    }
    totals.total = totals.total.saturating_add(breakdown.total);
}

/// Totals over every date from `start` to `end` on which the child is served
pub fn scheduled_totals(child: &Child, statuses: &StatusBook, start: NaiveDate, end: NaiveDate) -> ReportTotals {
    let mut totals = ReportTotals::default();
    for date in days_inclusive(start, end).filter(|date| child.serves_on(weekday_number(*date))) {
        record_scheduled_day(&mut totals, &fare_breakdown(Some(child), statuses.get(&child.id, date)));
    }
    totals
}

/// Counted breakdowns of every child on one day
pub fn day_breakdowns<'a>(
    children: &'a [Child],
    statuses: &StatusBook,
    date: NaiveDate,
) -> Vec<(&'a Child, FareBreakdown)> {
    children
        .iter()
        .filter_map(|child| {
            let record = statuses.get(&child.id, date);
            let breakdown = fare_breakdown(Some(child), record);
            is_counted(record.is_some(), &breakdown).then_some((child, breakdown))
        })
        .collect()
}
