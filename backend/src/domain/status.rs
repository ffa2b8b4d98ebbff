//! # Status Normalization
//!
//! A stored `StatusRecord` only carries what the user entered. Normalizing it
//! against the child's base fares yields a record with every field resolved,
//! and merging a `StatusPatch` produces the next stored record.

use shared::{Attendance, Child, PaymentStatus, StatusPatch, StatusRecord};

/// A status with every field resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedStatus {
    pub att: Attendance,
    pub pay: PaymentStatus,
    pub nota: String,
    pub trip_in: bool,
    pub trip_out: bool,
    pub fare_in: u64,
    pub fare_out: u64,
}

/// Resolve the missing fields of a status.
///
/// Without a record nothing was travelled. With a record, legs default to
/// travelled unless the child was marked absent.
pub fn normalize(child: &Child, record: Option<&StatusRecord>) -> NormalizedStatus {
    match record {
        None => NormalizedStatus {
            att: Attendance::Pending,
            pay: PaymentStatus::Pending,
            nota: String::new(),
            trip_in: false,
            trip_out: false,
            fare_in: child.fare_in,
            fare_out: child.fare_out,
        },
        Some(record) => {
            let travelled = record.att != Attendance::Absent;
            NormalizedStatus {
                att: record.att,
                pay: record.pay,
                nota: record.nota.clone(),
                trip_in: record.trip_in.unwrap_or(travelled),
                trip_out: record.trip_out.unwrap_or(travelled),
                fare_in: record.fare_in.unwrap_or(child.fare_in),
                fare_out: record.fare_out.unwrap_or(child.fare_out),
            }
        }
    }
}

/// Apply a patch on top of an optional stored record.
///
/// Each field takes the patch value, then the stored value, then its default.
/// Trip flags and fare overrides can be set but never cleared by a patch.
pub fn merge_patch(existing: Option<&StatusRecord>, patch: StatusPatch) -> StatusRecord {
    let base = existing.cloned().unwrap_or_default();
    StatusRecord {
        att: patch.att.unwrap_or(base.att),
        pay: patch.pay.unwrap_or(base.pay),
        nota: patch.nota.unwrap_or(base.nota),
        trip_in: patch.trip_in.or(base.trip_in),
        trip_out: patch.trip_out.or(base.trip_out),
        fare_in: patch.fare_in.or(base.fare_in),
        fare_out: patch.fare_out.or(base.fare_out),
    }
}
