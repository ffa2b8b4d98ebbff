//! Per-day fare computation.

use shared::{Child, FareBreakdown, StatusPatch, StatusRecord};

use super::errors::ChildValidationError;
use super::status::normalize;

/// Largest fare accepted for a single leg
pub const MAX_FARE: u64 = 10_000_000;

/// Reject a leg fare above `MAX_FARE`, naming the request field
pub fn check_fare(fare: u64, field: &'static str) -> Result<u64, ChildValidationError> {
    if fare > MAX_FARE {
        return Err(ChildValidationError::FareTooLarge { field, max: MAX_FARE });
    }
    Ok(fare)
}

/// Range-check the fare overrides carried by a status patch
pub fn check_patch_fares(patch: &StatusPatch) -> Result<(), ChildValidationError> {
    if let Some(fare) = patch.fare_in {
        check_fare(fare, "fareIn")?;
    }
    if let Some(fare) = patch.fare_out {
        check_fare(fare, "fareOut")?;
    }
    Ok(())
}

/// First fare above `MAX_FARE` in a child or record, as `(field, value)`
pub fn oversized_fare(child: Option<&Child>, record: Option<&StatusRecord>) -> Option<(&'static str, u64)> {
    let child_fares = child.map(|c| [("fareIn", Some(c.fare_in)), ("fareOut", Some(c.fare_out))]);
    let record_fares = record.map(|r| [("fareIn", r.fare_in), ("fareOut", r.fare_out)]);
    child_fares
        .into_iter()
        .chain(record_fares)
        .flatten()
        .find_map(|(field, fare)| fare.filter(|fare| *fare > MAX_FARE).map(|fare| (field, fare)))
}

/// Charge for one child on one day.
///
/// A missing child yields the zero breakdown, which callers treat as
/// "nothing to count".
pub fn fare_breakdown(child: Option<&Child>, record: Option<&StatusRecord>) -> FareBreakdown {
    let Some(child) = child else {
        return FareBreakdown::default();
    };

    let normalized = normalize(child, record);
    let fare_in = if normalized.trip_in { normalized.fare_in } else { 0 };
    let fare_out = if normalized.trip_out { normalized.fare_out } else { 0 };

    FareBreakdown {
        total: fare_in.saturating_add(fare_out),
        fare_in,
        fare_out,
        trip_in: normalized.trip_in,
        trip_out: normalized.trip_out,
        pay: normalized.pay,
        att: normalized.att,
        nota: normalized.nota,
    }
}

/// Currency as shown to users, e.g. `$1.234.567`
pub fn format_currency(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    format!("${}", grouped)
}
