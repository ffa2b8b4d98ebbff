//! Calendar domain logic for RutaKids.
//!
//! View ranges and titles for the month, week and year views, the per-day
//! markers drawn on the grid (holiday, inbound/outbound trips, trip class),
//! and the statistics shown next to each view. Calendar statistics include
//! future days; the historical month statistics do not.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use shared::{
    CalendarDayInfo, CalendarMonth, CalendarStatsResponse, CalendarView, DayTripClass, FuturePolicy, RangeStats,
    RangeStatsResponse,
};
use tracing::debug;

use super::aggregation::{day_breakdowns, month_stats, range_stats, DateWindow};
use super::dates::{days_inclusive, holiday_name, month_bounds, month_name, week_bounds, year_bounds, DateError};
use super::store::{AppStore, StoreHandle};

/// Calendar service that handles all calendar-related business logic
#[derive(Clone)]
pub struct CalendarService {
    store: StoreHandle,
}

impl CalendarService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Inclusive date range shown by a view around `date`
    pub fn view_range(&self, view: CalendarView, date: NaiveDate) -> Result<(NaiveDate, NaiveDate), DateError> {
        match view {
            CalendarView::Month => month_bounds(date.year(), date.month()),
            CalendarView::Week => Ok(week_bounds(date)),
            CalendarView::Year => year_bounds(date.year()),
        }
    }

    pub fn view_title(&self, view: CalendarView, date: NaiveDate) -> String {
        match view {
            CalendarView::Month => format!("{} {}", month_name(date.month()), date.year()),
            CalendarView::Week => {
                let (monday, _) = week_bounds(date);
                format!("Semana de {} {} {}", monday.day(), month_name(monday.month()), monday.year())
            }
            CalendarView::Year => format!("Año {}", date.year()),
        }
    }

    /// Statistics for the range of a view, future days included
    pub fn view_stats(&self, view: CalendarView, date: NaiveDate, today: NaiveDate) -> Result<CalendarStatsResponse> {
        let (start, end) = self.view_range(view, date)?;
        let window = DateWindow::calendar(start, end, today);
        let stats = self.store.read(|store| range_stats(&store.children, &store.statuses, &window));

        debug!("View stats for {:?} {}..{}: {:?}", view, start, end, stats);

        Ok(CalendarStatsResponse {
            view,
            title: self.view_title(view, date),
            start,
            end,
            stats,
        })
    }

    /// Range statistics with an explicit future policy
    pub fn range_stats(&self, start: NaiveDate, end: NaiveDate, future: FuturePolicy, today: NaiveDate) -> RangeStatsResponse {
        let window = DateWindow::new(start, end, future, today);
        let stats = self.store.read(|store| range_stats(&store.children, &store.statuses, &window));
        RangeStatsResponse { start, end, future, stats }
    }

    /// Historical statistics for a month, days after today excluded
    pub fn month_stats(&self, year: i32, month: u32, today: NaiveDate) -> Result<RangeStats> {
        let stats = self
            .store
            .read(|store| month_stats(&store.children, &store.statuses, year, month, today))?;
        Ok(stats)
    }

    pub fn day_info(&self, date: NaiveDate) -> CalendarDayInfo {
        self.store.read(|store| day_info(store, date))
    }

    /// Month grid starting on Monday with one marker set per day
    pub fn month_grid(&self, year: i32, month: u32) -> Result<CalendarMonth> {
        let (first, last) = month_bounds(year, month)?;
        let days = self
            .store
            .read(|store| days_inclusive(first, last).map(|date| day_info(store, date)).collect());

        Ok(CalendarMonth {
            year,
            month,
            title: format!("{} {}", month_name(month), year),
            first_weekday: first.weekday().num_days_from_monday(),
            days,
        })
    }
}

fn day_info(store: &AppStore, date: NaiveDate) -> CalendarDayInfo {
    let counted = day_breakdowns(&store.children, &store.statuses, date);

    let (mut both, mut in_only, mut out_only) = (0, 0, 0);
    for (_, breakdown) in &counted {
        match (breakdown.trip_in, breakdown.trip_out) {
            (true, true) => both += 1,
            (true, false) => in_only += 1,
            (false, true) => out_only += 1,
            (false, false) => {}
        }
    }

    let trip_class = match (both, in_only, out_only) {
        (0, 0, 0) => None,
        (_, 0, 0) => Some(DayTripClass::Both),
        (0, _, 0) => Some(DayTripClass::In),
        (0, 0, _) => Some(DayTripClass::Out),
        _ => Some(DayTripClass::Mixed),
    };

    CalendarDayInfo {
        date,
        holiday: holiday_name(date).map(str::to_string),
        trip_in: both + in_only > 0,
        trip_out: both + out_only > 0,
        trip_class,
    }
}
