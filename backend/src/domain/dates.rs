//! # Date Utilities
//!
//! Canonical `YYYY-MM-DD` date keys, the public-holiday table, month and week
//! arithmetic, and the Spanish month/day labels shown in every view.
//!
//! Weekday numbering follows two conventions:
//! - service days on a child use 0 = Sunday .. 6 = Saturday
//! - calendar grids start on Monday (0 = Monday .. 6 = Sunday)

use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use thiserror::Error;

pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub const DAY_NAMES: [&str; 7] = [
    "Domingo",
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
];

/// Colombian public holidays for 2026 as (month, day, name)
const HOLIDAYS_2026: [(u32, u32, &str); 18] = [
    (1, 1, "Año Nuevo"),
    (1, 12, "Día de los Reyes Magos"),
    (3, 23, "Día de San José"),
    (4, 2, "Jueves Santo"),
    (4, 3, "Viernes Santo"),
    (5, 1, "Día del Trabajo"),
    (5, 18, "Ascensión del Señor"),
    (6, 8, "Corpus Christi"),
    (6, 15, "Sagrado Corazón de Jesús"),
    (6, 29, "San Pedro y San Pablo"),
    (7, 20, "Independencia de Colombia"),
    (8, 7, "Batalla de Boyacá"),
    (8, 17, "La Asunción de la Virgen"),
    (10, 12, "Día de la Raza"),
    (11, 2, "Día de Todos los Santos"),
    (11, 16, "Independencia de Cartagena"),
    (12, 8, "Inmaculada Concepción"),
    (12, 25, "Día de Navidad"),
];

static HOLIDAYS: Lazy<HashMap<NaiveDate, &'static str>> = Lazy::new(|| {
    HOLIDAYS_2026
        .iter()
        .filter_map(|(month, day, name)| {
            NaiveDate::from_ymd_opt(2026, *month, *day).map(|date| (date, *name))
        })
        .collect()
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidFormat(String),

    #[error("Invalid month {0}, expected a value between 1 and 12")]
    InvalidMonth(u32),

    #[error("Year {0} is out of range")]
    YearOutOfRange(i32),
}

/// Parse a canonical `YYYY-MM-DD` key. Unpadded forms like `2026-3-2` are rejected.
pub fn parse_date(value: &str) -> Result<NaiveDate, DateError> {
    let value = value.trim();
    if value.len() != 10 {
        return Err(DateError::InvalidFormat(value.to_string()));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| DateError::InvalidFormat(value.to_string()))
}

/// Holiday name for a date, if any
pub fn holiday_name(date: NaiveDate) -> Option<&'static str> {
    HOLIDAYS.get(&date).copied()
}

/// Service-day weekday number, 0 = Sunday
pub fn weekday_number(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index as usize))
        .copied()
        .unwrap_or("")
}

pub fn day_name(date: NaiveDate) -> &'static str {
    DAY_NAMES[weekday_number(date) as usize]
}

/// Long label such as "Lunes 2 de Marzo 2026"
pub fn day_label(date: NaiveDate) -> String {
    format!(
        "{} {} de {} {}",
        day_name(date),
        date.day(),
        month_name(date.month()),
        date.year()
    )
}

/// First and last day of a month
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), DateError> {
    if !(1..=12).contains(&month) {
        return Err(DateError::InvalidMonth(month));
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(DateError::YearOutOfRange(year))?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|next| next.pred_opt())
        .ok_or(DateError::YearOutOfRange(year))?;
    Ok((first, last))
}

/// Monday and Sunday of the week containing `date`
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = date.weekday().num_days_from_monday() as i64;
    let monday = date - Duration::days(offset);
    (monday, monday + Duration::days(6))
}

pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), DateError> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(DateError::YearOutOfRange(year))?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31).ok_or(DateError::YearOutOfRange(year))?;
    Ok((first, last))
}

/// Every day from `start` to `end` inclusive; empty when `start > end`
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}
