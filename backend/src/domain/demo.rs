//! Demo data seeded on first start when no children exist.

use chrono::{Datelike, NaiveDate};
use shared::{Attendance, Child, ChildColor, PaymentStatus, StatusBook, StatusRecord};

use super::dates::{days_inclusive, weekday_number};

const DEMO_ADDRESS: &str = "Cra 15 # 80-20, Bogotá";

pub fn demo_children() -> Vec<Child> {
    vec![
        Child {
            id: "c1".to_string(),
            name: "Sofía González".to_string(),
            school: "Colegio Los Andes".to_string(),
            address: DEMO_ADDRESS.to_string(),
            fare_in: 15000,
            fare_out: 15000,
            days: [1, 2, 3, 4, 5].into_iter().collect(),
            color: ChildColor::Blue,
        },
        Child {
            id: "c2".to_string(),
            name: "Mateo González".to_string(),
            school: "Colegio San Marcos".to_string(),
            address: DEMO_ADDRESS.to_string(),
            fare_in: 18000,
            fare_out: 18000,
            days: [1, 3, 5].into_iter().collect(),
            color: ChildColor::Green,
        },
    ]
}

/// Statuses for the month of `today`, from the 1st up to and including today.
///
/// Earlier days before the 12th are paid, the second child misses the 14th,
/// and today is attended with payment pending.
pub fn demo_statuses(children: &[Child], today: NaiveDate) -> StatusBook {
    let mut book = StatusBook::new();
    let Some(first) = today.with_day(1) else {
        return book;
    };

    for date in days_inclusive(first, today) {
        let weekday = weekday_number(date);
        let day = date.day();
        for (index, child) in children.iter().enumerate() {
            if !child.serves_on(weekday) {
                continue;
            }
            let record = if date == today {
                StatusRecord {
                    att: Attendance::Attended,
                    pay: PaymentStatus::Pending,
                    ..Default::default()
                }
            } else {
                StatusRecord {
                    att: if day == 14 && index == 1 { Attendance::Absent } else { Attendance::Attended },
                    pay: if day < 12 { PaymentStatus::Paid } else { PaymentStatus::Pending },
                    ..Default::default()
                }
            };
            book.insert(&child.id, date, record);
        }
    }
    book
}
