//! # Status Service
//!
//! Daily attendance and payment edits: single-record patches, whole-day trip
//! editing, the quick payment toggle, and the per-day detail listing.
//!
//! ## Business Rules
//!
//! - A status can only be recorded for an existing child
//! - Holidays cannot be edited through the day editor
//! - The day editor charges the base fare for each travelled leg and zero for
//!   the other, keeping any payment state and note already recorded
//! - Marking an unrecorded day as paid assumes both legs were travelled

use anyhow::Result;
use chrono::NaiveDate;
use shared::{
    Attendance, DayDetail, DayDetailEntry, DayTripEntry, DayUpdateResponse, FareBreakdown, PaymentStatus,
    StatusPatch, StatusRecord, StatusResponse,
};
use tracing::{info, warn};

use super::aggregation::day_breakdowns;
use super::dates::{day_label, holiday_name, weekday_number};
use super::errors::StoreError;
use super::fare::check_patch_fares;
use super::store::{AppStore, StoreHandle};
use crate::storage::StorageKey;

#[derive(Clone)]
pub struct StatusService {
    store: StoreHandle,
}

impl StatusService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Stored record and computed breakdown for one child-day
    pub fn get_status(&self, child_id: &str, date: NaiveDate) -> Result<StatusResponse> {
        let response = self.store.read(|store| {
            store.child(child_id)?;
            Some(StatusResponse {
                child_id: child_id.to_string(),
                date,
                record: store.statuses.get(child_id, date).cloned(),
                breakdown: store.breakdown(child_id, date),
                saved: true,
            })
        });
        Ok(response.ok_or_else(|| StoreError::ChildNotFound(child_id.to_string()))?)
    }

    /// Fare breakdown for one child-day; the zero breakdown for unknown children
    pub fn day_breakdown(&self, child_id: &str, date: NaiveDate) -> FareBreakdown {
        self.store.read(|store| store.breakdown(child_id, date))
    }

    pub fn set_status(&self, child_id: &str, date: NaiveDate, patch: StatusPatch) -> Result<StatusResponse> {
        info!("Setting status: child={}, date={}, patch={:?}", child_id, date, patch);
        check_patch_fares(&patch)?;

        let ((record, breakdown), saved) = self.store.mutate(&[StorageKey::Statuses], |store| {
            let record = store.set_status(child_id, date, patch)?;
            Ok::<_, StoreError>((record, store.breakdown(child_id, date)))
        })?;

        Ok(StatusResponse {
            child_id: child_id.to_string(),
            date,
            record: Some(record),
            breakdown,
            saved,
        })
    }

    /// Remove a child-day record; returns whether the change was saved
    pub fn clear_status(&self, child_id: &str, date: NaiveDate) -> Result<bool> {
        info!("Clearing status: child={}, date={}", child_id, date);
        let (_, saved) = self
            .store
            .mutate(&[StorageKey::Statuses], |store| store.clear_status(child_id, date))?;
        Ok(saved)
    }

    /// Remove every child's record for a date
    pub fn clear_date_statuses(&self, date: NaiveDate) -> Result<DayUpdateResponse> {
        info!("Clearing every status on {}", date);
        let (affected, saved) = self
            .store
            .mutate::<_, StoreError>(&[StorageKey::Statuses], |store| Ok(store.clear_date_statuses(date)))?;

        if affected == 0 {
            warn!("No statuses recorded on {}", date);
        }

        Ok(DayUpdateResponse {
            date,
            affected,
            day_total: 0,
            saved,
        })
    }

    /// Record which legs each child travelled on a date.
    ///
    /// Every child is checked before anything is written, so one unknown child
    /// rejects the whole day.
    pub fn save_day_trips(&self, date: NaiveDate, entries: Vec<DayTripEntry>) -> Result<DayUpdateResponse> {
        info!("Saving {} trip entries for {}", entries.len(), date);

        if let Some(name) = holiday_name(date) {
            warn!("Rejected trip edit on holiday {}: {}", date, name);
            return Err(StoreError::HolidayLocked { date, name: name.to_string() }.into());
        }

        let ((affected, day_total), saved) = self.store.mutate(&[StorageKey::Statuses], |store| {
            let current: &AppStore = store;
            let records = entries
                .iter()
                .map(|entry| trip_record(current, date, entry).map(|record| (entry.child_id.as_str(), record)))
                .collect::<Result<Vec<_>, StoreError>>()?;

            for (child_id, record) in &records {
                store.put_status(child_id, date, record.clone())?;
            }
            Ok::<_, StoreError>((records.len(), counted_day_total(store, date)))
        })?;

        info!("Saved {} trip entries for {}, day total {}", affected, date, day_total);

        Ok(DayUpdateResponse {
            date,
            affected,
            day_total,
            saved,
        })
    }

    /// Quick payment toggle from the payments listing
    pub fn set_payment(&self, child_id: &str, date: NaiveDate, paid: bool) -> Result<StatusResponse> {
        info!("Setting payment: child={}, date={}, paid={}", child_id, date, paid);

        let ((record, breakdown), saved) = self.store.mutate(&[StorageKey::Statuses], |store| {
            let child = store
                .child(child_id)
                .ok_or_else(|| StoreError::ChildNotFound(child_id.to_string()))?;

            let mut record = store.statuses.get(child_id, date).cloned().unwrap_or_else(|| StatusRecord {
                att: Attendance::Attended,
                pay: PaymentStatus::Pending,
                nota: String::new(),
                trip_in: Some(true),
                trip_out: Some(true),
                fare_in: Some(child.fare_in),
                fare_out: Some(child.fare_out),
            });
            record.pay = if paid { PaymentStatus::Paid } else { PaymentStatus::Pending };

            store.put_status(child_id, date, record.clone())?;
            Ok::<_, StoreError>((record, store.breakdown(child_id, date)))
        })?;

        Ok(StatusResponse {
            child_id: child_id.to_string(),
            date,
            record: Some(record),
            breakdown,
            saved,
        })
    }

    /// Children served on the date's weekday with their breakdowns
    pub fn day_detail(&self, date: NaiveDate) -> DayDetail {
        let weekday = weekday_number(date);
        let entries = self.store.read(|store| {
            store
                .children
                .iter()
                .filter(|child| child.serves_on(weekday))
                .map(|child| DayDetailEntry {
                    child: child.clone(),
                    breakdown: store.breakdown(&child.id, date),
                    has_record: store.statuses.get(&child.id, date).is_some(),
                })
                .collect()
        });

        DayDetail {
            date,
            label: day_label(date),
            holiday: holiday_name(date).map(str::to_string),
            entries,
        }
    }
}

fn trip_record(store: &AppStore, date: NaiveDate, entry: &DayTripEntry) -> Result<StatusRecord, StoreError> {
    let child = store
        .child(&entry.child_id)
        .ok_or_else(|| StoreError::ChildNotFound(entry.child_id.clone()))?;
    let existing = store.statuses.get(&child.id, date);

    Ok(StatusRecord {
        att: if entry.trip_in || entry.trip_out { Attendance::Attended } else { Attendance::Absent },
        pay: existing.map(|record| record.pay).unwrap_or_default(),
        nota: existing.map(|record| record.nota.clone()).unwrap_or_default(),
        trip_in: Some(entry.trip_in),
        trip_out: Some(entry.trip_out),
        fare_in: Some(if entry.trip_in { child.fare_in } else { 0 }),
        fare_out: Some(if entry.trip_out { child.fare_out } else { 0 }),
    })
}

fn counted_day_total(store: &AppStore, date: NaiveDate) -> u64 {
    day_breakdowns(&store.children, &store.statuses, date)
        .iter()
        .fold(0u64, |total, (_, breakdown)| total.saturating_add(breakdown.total))
}
