use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Add, AddAssign};

/// Name used when nobody has configured a display name yet
pub const DEFAULT_USER_NAME: &str = "Usuario RutaKids";

/// Color tag shown next to a child in every view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildColor {
    #[default]
    Blue,
    Green,
    Orange,
    Pink,
}

/// A child using the school route.
///
/// Child ID format: "child::<epoch_millis>_<suffix>" for children created locally.
/// Imported children keep whatever ID they were exported with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub address: String,
    /// Base fare for the inbound leg ("Ida"), whole currency units
    #[serde(default)]
    pub fare_in: u64,
    /// Base fare for the outbound leg ("Regreso"), whole currency units
    #[serde(default)]
    pub fare_out: u64,
    /// Service weekdays, 0 = Sunday .. 6 = Saturday
    #[serde(default)]
    pub days: BTreeSet<u8>,
    #[serde(default)]
    pub color: ChildColor,
}

impl Child {
    /// Whether the route serves this child on the given weekday (0 = Sunday)
    pub fn serves_on(&self, weekday: u8) -> bool {
        self.days.contains(&weekday)
    }

    /// First word of the name, used in compact listings
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }

    /// Upper-cased first letter of the name, 'N' when the name is blank
    pub fn initial(&self) -> char {
        self.name
            .trim()
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('N')
    }
}

/// Attendance state for one child on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Attendance {
    #[serde(rename = "asistio")]
    Attended,
    #[serde(rename = "no")]
    Absent,
    #[default]
    #[serde(rename = "pendiente")]
    Pending,
}

/// Payment state for one child on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "pagado")]
    Paid,
    #[default]
    #[serde(rename = "pendiente")]
    Pending,
}

/// User-entered status for one child on one day.
///
/// `None` trip flags are derived from attendance and `None` fares fall back to
/// the child's base fares when the record is normalized.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    #[serde(default)]
    pub att: Attendance,
    #[serde(default)]
    pub pay: PaymentStatus,
    #[serde(default)]
    pub nota: String,
    #[serde(default)]
    pub trip_in: Option<bool>,
    #[serde(default)]
    pub trip_out: Option<bool>,
    #[serde(default)]
    pub fare_in: Option<u64>,
    #[serde(default)]
    pub fare_out: Option<u64>,
}

/// Partial status update; every field left as `None` keeps its current value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusPatch {
    pub att: Option<Attendance>,
    pub pay: Option<PaymentStatus>,
    pub nota: Option<String>,
    pub trip_in: Option<bool>,
    pub trip_out: Option<bool>,
    pub fare_in: Option<u64>,
    pub fare_out: Option<u64>,
}

/// Status records indexed by child and then by date
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusBook(BTreeMap<String, BTreeMap<NaiveDate, StatusRecord>>);

impl StatusBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, child_id: &str, date: NaiveDate) -> Option<&StatusRecord> {
        self.0.get(child_id).and_then(|days| days.get(&date))
    }

    pub fn insert(&mut self, child_id: &str, date: NaiveDate, record: StatusRecord) -> Option<StatusRecord> {
        self.0
            .entry(child_id.to_string())
            .or_default()
            .insert(date, record)
    }

    pub fn remove(&mut self, child_id: &str, date: NaiveDate) -> Option<StatusRecord> {
        let days = self.0.get_mut(child_id)?;
        let removed = days.remove(&date);
        if days.is_empty() {
            self.0.remove(child_id);
        }
        removed
    }

    /// Drop every record of a child, returning how many were removed
    pub fn remove_child(&mut self, child_id: &str) -> usize {
        self.0.remove(child_id).map(|days| days.len()).unwrap_or(0)
    }

    /// Drop every child's record for one date, returning how many were removed
    pub fn remove_date(&mut self, date: NaiveDate) -> usize {
        let mut removed = 0;
        self.0.retain(|_, days| {
            if days.remove(&date).is_some() {
                removed += 1;
            }
            !days.is_empty()
        });
        removed
    }

    pub fn child_records(&self, child_id: &str) -> Option<&BTreeMap<NaiveDate, StatusRecord>> {
        self.0.get(child_id)
    }

    /// Records of one child in date order
    pub fn for_child<'a>(&'a self, child_id: &str) -> impl Iterator<Item = (NaiveDate, &'a StatusRecord)> + 'a {
        self.0
            .get(child_id)
            .into_iter()
            .flat_map(|days| days.iter().map(|(date, record)| (*date, record)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NaiveDate, &StatusRecord)> + '_ {
        self.0.iter().flat_map(|(child_id, days)| {
            days.iter()
                .map(move |(date, record)| (child_id.as_str(), *date, record))
        })
    }

    /// Total number of records across all children
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Split a legacy "<childId>_<YYYY-MM-DD>" key on its last underscore
pub fn split_legacy_status_key(key: &str) -> Option<(&str, NaiveDate)> {
    let (child_id, date) = key.rsplit_once('_')?;
    if child_id.is_empty() {
        return None;
    }
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((child_id, date))
}

/// Computed charge for one child on one day, split by leg.
///
/// The default value is the "no child, no charge" sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareBreakdown {
    pub total: u64,
    /// Charged inbound amount (0 when the leg was not travelled)
    pub fare_in: u64,
    /// Charged outbound amount (0 when the leg was not travelled)
    pub fare_out: u64,
    pub trip_in: bool,
    pub trip_out: bool,
    pub pay: PaymentStatus,
    pub att: Attendance,
    pub nota: String,
}

impl FareBreakdown {
    pub fn is_paid(&self) -> bool {
        self.pay == PaymentStatus::Paid
    }
}

/// Aggregated totals over a set of child-days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeStats {
    pub total_income: u64,
    pub trips_in: u32,
    pub trips_out: u32,
    /// Number of paid child-days
    pub paid: u32,
    /// Number of child-days with payment pending
    pub pending: u32,
    pub paid_amount: u64,
    pub pending_amount: u64,
    pub attended: u32,
    pub absent: u32,
    /// Number of child-days that were counted
    pub days: u32,
}

impl AddAssign for RangeStats {
    fn add_assign(&mut self, other: Self) {
        self.total_income = self.total_income.saturating_add(other.total_income);
        self.trips_in += other.trips_in;
        self.trips_out += other.trips_out;
        self.paid += other.paid;
        self.pending += other.pending;
        self.paid_amount = self.paid_amount.saturating_add(other.paid_amount);
        self.pending_amount = self.pending_amount.saturating_add(other.pending_amount);
        self.attended += other.attended;
        self.absent += other.absent;
        self.days += other.days;
    }
}

impl Add for RangeStats {
    type Output = RangeStats;

    fn add(mut self, other: Self) -> Self::Output {
        self += other;
        self
    }
}

/// Whether days after "today" take part in an aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuturePolicy {
    /// Calendar display: every day in the range counts
    #[default]
    Include,
    /// Historical reporting: days after today are ignored
    Exclude,
}

/// Calendar granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    #[default]
    Month,
    Week,
    Year,
}

/// Which legs were travelled on a calendar day, across all children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayTripClass {
    Both,
    In,
    Out,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub user_name: String,
    pub notifications_enabled: bool,
    pub payment_reminder_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_name: DEFAULT_USER_NAME.to_string(),
            notifications_enabled: true,
            payment_reminder_days: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub name: String,
    pub initials: String,
}

impl UserProfile {
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self {
            name: name.to_string(),
            initials: Self::initials_for(name),
        }
    }

    /// First letters of the first two words, "RK" for a blank name
    pub fn initials_for(name: &str) -> String {
        let initials: String = name
            .split_whitespace()
            .take(2)
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        if initials.is_empty() {
            "RK".to_string()
        } else {
            initials
        }
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::from_name(DEFAULT_USER_NAME)
    }
}

/// Whole-state snapshot used for export, import and remote sync
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    pub children: Vec<Child>,
    pub statuses: StatusBook,
    pub config: AppConfig,
    pub user: UserProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Children
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChildRequest {
    pub name: String,
    pub school: String,
    #[serde(default)]
    pub address: String,
    /// Missing fares count as 0
    #[serde(default)]
    pub fare_in: Option<i64>,
    #[serde(default)]
    pub fare_out: Option<i64>,
    #[serde(default)]
    pub days: Vec<u8>,
    #[serde(default)]
    pub color: Option<ChildColor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateChildRequest {
    pub name: Option<String>,
    pub school: Option<String>,
    pub address: Option<String>,
    pub fare_in: Option<i64>,
    pub fare_out: Option<i64>,
    pub days: Option<Vec<u8>>,
    pub color: Option<ChildColor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildResponse {
    pub child: Child,
    /// False when the change is only held in memory because the disk write failed
    pub saved: bool,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildListResponse {
    pub children: Vec<Child>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueNamesResponse {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildStatusesResponse {
    pub child_id: String,
    pub statuses: BTreeMap<NaiveDate, StatusRecord>,
}

// ---------------------------------------------------------------------------
// Statuses and days
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub child_id: String,
    pub date: NaiveDate,
    pub record: Option<StatusRecord>,
    pub breakdown: FareBreakdown,
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentToggleRequest {
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTripEntry {
    pub child_id: String,
    pub trip_in: bool,
    pub trip_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTripsRequest {
    pub entries: Vec<DayTripEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayUpdateResponse {
    pub date: NaiveDate,
    /// Records written or removed by the operation
    pub affected: usize,
    pub day_total: u64,
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDetailEntry {
    pub child: Child,
    pub breakdown: FareBreakdown,
    pub has_record: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDetail {
    pub date: NaiveDate,
    pub label: String,
    pub holiday: Option<String>,
    /// Children whose service days include this weekday
    pub entries: Vec<DayDetailEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayResponse {
    pub date: NaiveDate,
    pub holiday: Option<String>,
}

// ---------------------------------------------------------------------------
// Calendar and statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeStatsResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub future: FuturePolicy,
    pub stats: RangeStats,
}

/// Markers for a single calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDayInfo {
    pub date: NaiveDate,
    pub holiday: Option<String>,
    pub trip_in: bool,
    pub trip_out: bool,
    pub trip_class: Option<DayTripClass>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub title: String,
    /// Weekday of the 1st, 0 = Monday .. 6 = Sunday
    pub first_weekday: u32,
    pub days: Vec<CalendarDayInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarStatsResponse {
    pub view: CalendarView,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub stats: RangeStats,
}

// ---------------------------------------------------------------------------
// Dashboard and reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildMonthSummary {
    pub child_id: String,
    pub name: String,
    pub school: String,
    pub color: ChildColor,
    pub paid_amount: u64,
    pub pending_amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub stats: RangeStats,
    pub children_count: usize,
    pub child_names: Vec<String>,
    pub children: Vec<ChildMonthSummary>,
    /// Records with payment pending, across every month
    pub pending_payments: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDay {
    pub date: NaiveDate,
    pub total: u64,
    pub fare_in: u64,
    pub fare_out: u64,
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildPayments {
    pub child_id: String,
    pub name: String,
    pub color: ChildColor,
    pub days: Vec<PaymentDay>,
    pub pending_days: usize,
    pub month_total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentsMonth {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub children: Vec<ChildPayments>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub days: u32,
    pub trips_in: u32,
    pub trips_out: u32,
    pub attended: u32,
    pub absent: u32,
    pub paid: u64,
    pub pending: u64,
    pub total: u64,
}

impl AddAssign for ReportTotals {
    fn add_assign(&mut self, other: Self) {
        self.days += other.days;
        self.trips_in += other.trips_in;
        self.trips_out += other.trips_out;
        self.attended += other.attended;
        self.absent += other.absent;
        self.paid = self.paid.saturating_add(other.paid);
        self.pending = self.pending.saturating_add(other.pending);
        self.total = self.total.saturating_add(other.total);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthReportRow {
    pub child_id: String,
    pub short_name: String,
    pub color: ChildColor,
    #[serde(flatten)]
    pub totals: ReportTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthReport {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub rows: Vec<MonthReportRow>,
    pub totals: ReportTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearReport {
    pub year: i32,
    pub months: Vec<MonthReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Month,
    Year,
}

/// One child's scheduled days over a report period.
///
/// `days` counts the dates whose weekday is one of the child's service days,
/// whether or not a record exists for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildActivity {
    pub child_id: String,
    pub name: String,
    pub school: String,
    pub color: ChildColor,
    #[serde(flatten)]
    pub totals: ReportTotals,
}

/// Monthly or annual report over every registered child
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport {
    pub period: ReportPeriod,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub children: Vec<ChildActivity>,
    pub totals: ReportTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayReportEntry {
    pub child_id: String,
    pub name: String,
    pub school: String,
    pub breakdown: FareBreakdown,
}

/// Daily report over the children served on the date's weekday
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayReport {
    pub date: NaiveDate,
    pub label: String,
    pub holiday: Option<String>,
    pub entries: Vec<DayReportEntry>,
    pub totals: ReportTotals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PendingPayment,
    Absences,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    pub time_label: String,
    pub unread: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

// ---------------------------------------------------------------------------
// Data management
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub children: usize,
    pub statuses: usize,
    pub saved: bool,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResetRequest {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateConfigRequest {
    pub user_name: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub payment_reminder_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub initials: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub config: AppConfig,
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: UserProfile,
    pub saved: bool,
}
