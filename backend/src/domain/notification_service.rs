//! Payment and attendance alerts for the current month.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use shared::{Attendance, Notification, NotificationKind, NotificationsResponse, PaymentStatus};
use tracing::debug;

use super::dates::month_bounds;
use super::fare::{fare_breakdown, format_currency};
use super::store::StoreHandle;

#[derive(Clone)]
pub struct NotificationService {
    store: StoreHandle,
}

impl NotificationService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Alerts for the month of `today`.
    ///
    /// Each child gets a pending-payment alert when some record of the month
    /// is unpaid, and an absence alert (unread from the second absence on).
    /// A read system notice always closes the list.
    pub fn notifications(&self, today: NaiveDate) -> Result<NotificationsResponse> {
        let (first, last) = month_bounds(today.year(), today.month())?;

        let mut notifications = self.store.read(|store| {
            let mut notifications = Vec::new();
            for child in &store.children {
                let (mut pending_count, mut pending_total, mut absences) = (0usize, 0u64, 0usize);
                let records = store.statuses.child_records(&child.id);
                for (_, record) in records.into_iter().flat_map(|days| days.range(first..=last)) {
                    if record.pay == PaymentStatus::Pending {
                        pending_count += 1;
                        pending_total = pending_total.saturating_add(fare_breakdown(Some(child), Some(record)).total);
                    }
                    if record.att == Attendance::Absent {
                        absences += 1;
                    }
                }

                if pending_count > 0 {
                    notifications.push(Notification {
                        kind: NotificationKind::PendingPayment,
                        title: format!("Pago pendiente · {}", child.first_name()),
                        description: format!(
                            "{} día(s) sin pago registrado. Total: {}",
                            pending_count,
                            format_currency(pending_total)
                        ),
                        time_label: "Hoy".to_string(),
                        unread: true,
                    });
                }

                if absences > 0 {
                    notifications.push(Notification {
                        kind: NotificationKind::Absences,
                        title: format!("Inasistencias · {}", child.first_name()),
                        description: format!("{} inasistencia(s) registradas este mes", absences),
                        time_label: "Este mes".to_string(),
                        unread: absences > 1,
                    });
                }
            }
            notifications
        });

        notifications.push(Notification {
            kind: NotificationKind::System,
            title: "Sistema actualizado".to_string(),
            description: "Los días de servicio están sincronizados automáticamente".to_string(),
            time_label: "Sistema".to_string(),
            unread: false,
        });

        let unread_count = notifications.iter().filter(|n| n.unread).count();
        debug!("{} notifications, {} unread", notifications.len(), unread_count);

        Ok(NotificationsResponse {
            notifications,
            unread_count,
        })
    }
}
