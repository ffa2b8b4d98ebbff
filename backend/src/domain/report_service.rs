//! # Report Service
//!
//! Dashboard metrics, the monthly payments listing, the yearly summary and
//! its CSV export. Historical figures never include days after "today",
//! which every operation takes explicitly.
//!
//! The activity reports (daily, monthly, annual) work on scheduled days
//! instead: every date whose weekday is one of a child's service days counts,
//! recorded or not, future or not.

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate};
use shared::{
    ActivityReport, ChildActivity, ChildMonthSummary, ChildPayments, DashboardMetrics, DayReport, DayReportEntry,
    MonthReport, MonthReportRow, PaymentDay, PaymentStatus, PaymentsMonth, ReportPeriod, ReportTotals, YearReport,
};
use tracing::info;

use super::aggregation::{child_range_stats, month_stats, record_scheduled_day, scheduled_totals, DateWindow};
use super::dates::{day_label, holiday_name, month_bounds, month_name, weekday_number, year_bounds};
use super::fare::fare_breakdown;
use super::store::{AppStore, StoreHandle};

#[derive(Clone)]
pub struct ReportService {
    store: StoreHandle,
}

impl ReportService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Figures for the dashboard cards of today's month.
    ///
    /// Per-child amounts cover every record of the month, including days
    /// after today; the headline statistics do not.
    pub fn dashboard(&self, today: NaiveDate) -> Result<DashboardMetrics> {
        let (year, month) = (today.year(), today.month());
        let (first, last) = month_bounds(year, month)?;

        self.store.read(|store| -> Result<DashboardMetrics> {
            let stats = month_stats(&store.children, &store.statuses, year, month, today)?;

            let children = store
                .children
                .iter()
                .map(|child| {
                    let (mut paid_amount, mut pending_amount) = (0u64, 0u64);
                    let records = store.statuses.child_records(&child.id);
                    for (_, record) in records.into_iter().flat_map(|days| days.range(first..=last)) {
                        let breakdown = fare_breakdown(Some(child), Some(record));
                        match breakdown.pay {
                            PaymentStatus::Paid => paid_amount = paid_amount.saturating_add(breakdown.total),
                            PaymentStatus::Pending => pending_amount = pending_amount.saturating_add(breakdown.total),
                        }
                    }
                    ChildMonthSummary {
                        child_id: child.id.clone(),
                        name: child.name.clone(),
                        school: child.school.clone(),
                        color: child.color,
                        paid_amount,
                        pending_amount,
                    }
                })
                .collect::<Vec<_>>();

            let pending_payments = store
                .statuses
                .iter()
                .filter(|(_, _, record)| record.pay == PaymentStatus::Pending)
                .count();

            Ok(DashboardMetrics {
                year,
                month,
                month_name: month_name(month).to_string(),
                stats,
                children_count: store.children.len(),
                child_names: store.children.iter().map(|child| child.first_name().to_string()).collect(),
                children,
                pending_payments,
            })
        })
    }

    /// Charged days per child for a month, in date order
    pub fn payments_month(&self, year: i32, month: u32) -> Result<PaymentsMonth> {
        let (first, last) = month_bounds(year, month)?;

        let children = self.store.read(|store| {
            store
                .children
                .iter()
                .filter_map(|child| {
                    let records = store.statuses.child_records(&child.id)?;
                    let days: Vec<PaymentDay> = records
                        .range(first..=last)
                        .filter_map(|(date, record)| {
                            let breakdown = fare_breakdown(Some(child), Some(record));
                            (breakdown.total > 0).then(|| PaymentDay {
                                date: *date,
                                total: breakdown.total,
                                fare_in: breakdown.fare_in,
                                fare_out: breakdown.fare_out,
                                paid: breakdown.is_paid(),
                            })
                        })
                        .collect();
                    if days.is_empty() {
                        return None;
                    }
                    Some(ChildPayments {
                        child_id: child.id.clone(),
                        name: child.name.clone(),
                        color: child.color,
                        pending_days: days.iter().filter(|day| !day.paid).count(),
                        month_total: days.iter().fold(0u64, |total, day| total.saturating_add(day.total)),
                        days,
                    })
                })
                .collect()
        });

        Ok(PaymentsMonth {
            year,
            month,
            month_name: month_name(month).to_string(),
            children,
        })
    }

    /// Per-month summary for a year, up to today's month
    pub fn year_report(&self, year: i32, today: NaiveDate) -> Result<YearReport> {
        let last_month = if year < today.year() {
            12
        } else if year == today.year() {
            today.month()
        } else {
            0
        };

        let months = self.store.read(|store| {
            (1..=last_month)
                .map(|month| build_month_report(store, year, month, today))
                .filter_map(|report| match report {
                    Ok(report) if report.rows.is_empty() => None,
                    other => Some(other),
                })
                .collect::<Result<Vec<_>>>()
        })?;

        info!("Year report {}: {} months with activity", year, months.len());
        Ok(YearReport { year, months })
    }

    pub fn month_report(&self, year: i32, month: u32, today: NaiveDate) -> Result<MonthReport> {
        self.store.read(|store| build_month_report(store, year, month, today))
    }

    /// CSV rendering of a month report with a closing total line
    pub fn month_csv(&self, year: i32, month: u32, today: NaiveDate) -> Result<String> {
        let report = self.month_report(year, month, today)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "Niño",
            "Total días",
            "Días ida",
            "Días regreso",
            "Asistencias",
            "Ausencias",
            "Pagado",
            "Pendiente",
            "Total",
        ])?;
        for row in &report.rows {
            write_totals(&mut writer, &row.short_name, &row.totals)?;
        }
        let total_label = format!("TOTAL {}", report.month_name.to_uppercase());
        write_totals(&mut writer, &total_label, &report.totals)?;

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush CSV writer: {}", e.error()))?;
        let csv = String::from_utf8(bytes).context("CSV output is not valid UTF-8")?;

        info!("Generated CSV report for {}/{} with {} rows", month, year, report.rows.len());
        Ok(csv)
    }

    /// Every child served on the date's weekday, with its charge and status
    pub fn day_report(&self, date: NaiveDate) -> DayReport {
        let weekday = weekday_number(date);
        let (entries, totals) = self.store.read(|store| {
            let mut totals = ReportTotals::default();
            let entries: Vec<DayReportEntry> = store
                .children
                .iter()
                .filter(|child| child.serves_on(weekday))
                .map(|child| {
                    let breakdown = store.breakdown(&child.id, date);
                    record_scheduled_day(&mut totals, &breakdown);
                    DayReportEntry {
                        child_id: child.id.clone(),
                        name: child.name.clone(),
                        school: child.school.clone(),
                        breakdown,
                    }
                })
                .collect();
            (entries, totals)
        });

        info!("Day report {}: {} active children", date, entries.len());
        DayReport {
            date,
            label: day_label(date),
            holiday: holiday_name(date).map(str::to_string),
            entries,
            totals,
        }
    }

    pub fn month_activity(&self, year: i32, month: u32) -> Result<ActivityReport> {
        let (start, end) = month_bounds(year, month)?;
        let title = format!("{} {}", month_name(month), year);
        Ok(self.activity_report(ReportPeriod::Month, title, start, end))
    }

    pub fn year_activity(&self, year: i32) -> Result<ActivityReport> {
        let (start, end) = year_bounds(year)?;
        Ok(self.activity_report(ReportPeriod::Year, format!("Año {}", year), start, end))
    }

    fn activity_report(&self, period: ReportPeriod, title: String, start: NaiveDate, end: NaiveDate) -> ActivityReport {
        let children: Vec<ChildActivity> = self.store.read(|store| {
            store
                .children
                .iter()
                .map(|child| ChildActivity {
                    child_id: child.id.clone(),
                    name: child.name.clone(),
                    school: child.school.clone(),
                    color: child.color,
                    totals: scheduled_totals(child, &store.statuses, start, end),
                })
                .collect()
        });
        let totals = children.iter().fold(ReportTotals::default(), |mut totals, child| {
            totals += child.totals;
            totals
        });

        info!("Activity report {}: {} children, {} scheduled days", title, children.len(), totals.days);
        ActivityReport {
            period,
            title,
            start,
            end,
            children,
            totals,
        }
    }
}

fn build_month_report(store: &AppStore, year: i32, month: u32, today: NaiveDate) -> Result<MonthReport> {
    let (first, last) = month_bounds(year, month)?;
    let window = DateWindow::historical(first, last, today);

    let rows: Vec<MonthReportRow> = store
        .children
        .iter()
        .filter_map(|child| {
            let stats = child_range_stats(child, &store.statuses, &window);
            (stats.days > 0).then(|| MonthReportRow {
                child_id: child.id.clone(),
                short_name: child.first_name().to_string(),
                color: child.color,
                totals: ReportTotals {
                    days: stats.days,
                    trips_in: stats.trips_in,
                    trips_out: stats.trips_out,
                    attended: stats.attended,
                    absent: stats.absent,
                    paid: stats.paid_amount,
                    pending: stats.pending_amount,
                    total: stats.paid_amount.saturating_add(stats.pending_amount),
                },
            })
        })
        .collect();

    let totals = rows.iter().fold(ReportTotals::default(), |mut totals, row| {
        totals += row.totals;
        totals
    });

    Ok(MonthReport {
        year,
        month,
        month_name: month_name(month).to_string(),
        rows,
        totals,
    })
}

fn write_totals(writer: &mut csv::Writer<Vec<u8>>, label: &str, totals: &ReportTotals) -> csv::Result<()> {
    writer.write_record([
        label.to_string(),
        totals.days.to_string(),
        totals.trips_in.to_string(),
        totals.trips_out.to_string(),
        totals.attended.to_string(),
        totals.absent.to_string(),
        totals.paid.to_string(),
        totals.pending.to_string(),
        totals.total.to_string(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::StoreError;
    use crate::storage::test_utils::TestEnvironment;
    use crate::storage::StorageKey;
    use shared::{Attendance, Child, ChildColor, StatusPatch};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn patch(att: Attendance, pay: PaymentStatus) -> StatusPatch {
        StatusPatch { att: Some(att), pay: Some(pay), ..Default::default() }
    }

    fn setup() -> (TestEnvironment, ReportService) {
        let env = TestEnvironment::new().unwrap();
        let store = env.empty_store();
        store
            .mutate::<_, StoreError>(&[StorageKey::Children, StorageKey::Statuses], |s| {
                s.add_child(Child {
                    id: "c1".to_string(),
                    name: "Sofía González".to_string(),
                    school: "Colegio Los Andes".to_string(),
                    address: String::new(),
                    fare_in: 15000,
                    fare_out: 15000,
                    days: [1, 2, 3, 4, 5].into_iter().collect(),
                    color: ChildColor::Blue,
                });
                s.add_child(Child {
                    id: "c2".to_string(),
                    name: "Mateo González".to_string(),
                    school: "Colegio San Marcos".to_string(),
                    address: String::new(),
                    fare_in: 18000,
                    fare_out: 18000,
                    days: [1, 3, 5].into_iter().collect(),
                    color: ChildColor::Green,
                });
                s.set_status("c1", date(2026, 2, 16), patch(Attendance::Attended, PaymentStatus::Paid))?;
                s.set_status("c1", date(2026, 3, 2), patch(Attendance::Attended, PaymentStatus::Paid))?;
                s.set_status("c1", date(2026, 3, 3), patch(Attendance::Attended, PaymentStatus::Pending))?;
                s.set_status("c2", date(2026, 3, 4), patch(Attendance::Absent, PaymentStatus::Pending))?;
                s.set_status("c1", date(2026, 3, 20), patch(Attendance::Attended, PaymentStatus::Pending))?;
                Ok(())
            })
            .unwrap();
        (env, ReportService::new(store))
    }

    #[test]
    fn test_dashboard() {
        let (_env, service) = setup();
        let metrics = service.dashboard(date(2026, 3, 10)).unwrap();

        assert_eq!(metrics.month_name, "Marzo");
        assert_eq!(metrics.children_count, 2);
        assert_eq!(metrics.child_names, vec!["Sofía".to_string(), "Mateo".to_string()]);
        // The 20th is in the future
        assert_eq!(metrics.stats.days, 3);
        assert_eq!(metrics.stats.paid_amount, 30000);
        assert_eq!(metrics.stats.pending_amount, 30000);
        assert_eq!(metrics.stats.absent, 1);
        assert_eq!(metrics.pending_payments, 3);

        let sofia = &metrics.children[0];
        assert_eq!(sofia.paid_amount, 30000);
        assert_eq!(sofia.pending_amount, 60000);
        assert_eq!(metrics.children[1].pending_amount, 0);
    }

    #[test]
    fn test_payments_month_lists_charged_days() {
        let (_env, service) = setup();
        let payments = service.payments_month(2026, 3).unwrap();

        // Mateo was absent, so nothing was charged
        assert_eq!(payments.children.len(), 1);
        let sofia = &payments.children[0];
        assert_eq!(sofia.days.len(), 3);
        assert_eq!(sofia.days[0].date, date(2026, 3, 2));
        assert!(sofia.days[0].paid);
        assert_eq!(sofia.pending_days, 2);
        assert_eq!(sofia.month_total, 90000);
    }

    #[test]
    fn test_year_report() {
        let (_env, service) = setup();
        let report = service.year_report(2026, date(2026, 3, 10)).unwrap();

        assert_eq!(report.months.len(), 2);
        let february = &report.months[0];
        assert_eq!(february.month, 2);
        assert_eq!(february.totals.total, 30000);

        let march = &report.months[1];
        assert_eq!(march.rows.len(), 2);
        assert_eq!(march.rows[0].short_name, "Sofía");
        assert_eq!(march.rows[0].totals.days, 2);
        assert_eq!(march.rows[1].totals.days, 1);
        assert_eq!(march.rows[1].totals.trips_in, 0);
        assert_eq!(march.totals.days, 3);
        assert_eq!(march.totals.paid + march.totals.pending, march.totals.total);

        assert!(service.year_report(2027, date(2026, 3, 10)).unwrap().months.is_empty());
        assert_eq!(service.year_report(2025, date(2026, 3, 10)).unwrap().months.len(), 0);
    }

    #[test]
    fn test_month_csv() {
        let (_env, service) = setup();
        let csv = service.month_csv(2026, 3, date(2026, 3, 10)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "Niño,Total días,Días ida,Días regreso,Asistencias,Ausencias,Pagado,Pendiente,Total"
        );
        assert_eq!(lines[1], "Sofía,2,2,2,2,0,30000,30000,60000");
        assert_eq!(lines[2], "Mateo,1,0,0,0,1,0,0,0");
        assert_eq!(lines[3], "TOTAL MARZO,3,2,2,2,1,30000,30000,60000");
    }

    #[test]
    fn test_day_report_covers_active_children() {
        let (_env, service) = setup();

        // Wednesday: both children are served, Mateo was absent
        let wednesday = service.day_report(date(2026, 3, 4));
        assert_eq!(wednesday.label, "Miércoles 4 de Marzo 2026");
        assert_eq!(wednesday.entries.len(), 2);
        assert_eq!(wednesday.totals.days, 2);
        assert_eq!(wednesday.totals.attended, 0);
        assert_eq!(wednesday.totals.absent, 1);
        assert_eq!(wednesday.totals.total, 0);

        // Tuesday: only Sofía is served
        let tuesday = service.day_report(date(2026, 3, 3));
        assert_eq!(tuesday.entries.len(), 1);
        assert_eq!(tuesday.entries[0].school, "Colegio Los Andes");
        assert_eq!(tuesday.entries[0].breakdown.fare_in, 15000);
        assert_eq!(tuesday.totals.attended, 1);
        assert_eq!(tuesday.totals.pending, 30000);
        assert_eq!(tuesday.totals.paid, 0);
        assert_eq!(tuesday.totals.total, 30000);
    }

    #[test]
    fn test_month_activity_counts_scheduled_days() {
        let (_env, service) = setup();
        let report = service.month_activity(2026, 3).unwrap();

        assert_eq!(report.title, "Marzo 2026");
        assert_eq!(report.period, ReportPeriod::Month);
        assert_eq!(report.children.len(), 2);

        // Weekdays of March 2026, future days included
        let sofia = &report.children[0].totals;
        assert_eq!(sofia.days, 22);
        assert_eq!(sofia.attended, 3);
        assert_eq!(sofia.absent, 0);
        assert_eq!(sofia.paid, 30000);
        assert_eq!(sofia.pending, 60000);
        assert_eq!(sofia.total, 90000);

        // Mondays, Wednesdays and Fridays
        let mateo = &report.children[1].totals;
        assert_eq!(mateo.days, 13);
        assert_eq!(mateo.absent, 1);
        assert_eq!(mateo.total, 0);

        assert_eq!(report.totals.days, 35);
        assert_eq!(report.totals.attended, 3);
        assert_eq!(report.totals.absent, 1);
        assert_eq!(report.totals.paid + report.totals.pending, report.totals.total);

        assert!(service.month_activity(2026, 13).is_err());
    }

    #[test]
    fn test_year_activity_spans_whole_year() {
        let (_env, service) = setup();
        let report = service.year_activity(2026).unwrap();

        assert_eq!(report.title, "Año 2026");
        assert_eq!(report.start, date(2026, 1, 1));
        assert_eq!(report.end, date(2026, 12, 31));
        // 2026 has 261 weekdays
        assert_eq!(report.children[0].totals.days, 261);
        assert_eq!(report.children[0].totals.attended, 4);
        assert_eq!(report.children[0].totals.total, 120000);
        assert_eq!(report.totals.paid, 60000);
    }
}
