//! # Child Service
//!
//! Validated creation, update and removal of the children on the route.
//! Removing a child also removes every status recorded for it.

use anyhow::Result;
use chrono::Utc;
use shared::{
    Child, ChildListResponse, ChildResponse, ChildStatusesResponse, CreateChildRequest, UniqueNamesResponse,
    UpdateChildRequest,
};
use std::collections::BTreeSet;
use tracing::{info, warn};
use uuid::Uuid;

use super::errors::{ChildValidationError, StoreError};
use super::fare::check_fare;
use super::store::{ChildChanges, StoreHandle};
use crate::storage::StorageKey;

pub const MIN_TEXT_LEN: usize = 3;
pub const MAX_TEXT_LEN: usize = 100;

#[derive(Clone)]
pub struct ChildService {
    store: StoreHandle,
}

impl ChildService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// "child::<epoch_millis>_<8 hex chars>"
    pub fn generate_id(timestamp_millis: i64) -> String {
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
        format!("child::{}_{}", timestamp_millis, suffix)
    }

    pub fn create_child(&self, request: CreateChildRequest) -> Result<ChildResponse> {
        info!("Creating child: name={}, school={}", request.name, request.school);

        let (name, school) = validate_name_and_school(&request.name, &request.school)?;
        let fare_in = validate_fare(request.fare_in.unwrap_or(0), "fareIn")?;
        let fare_out = validate_fare(request.fare_out.unwrap_or(0), "fareOut")?;
        let days = validate_days(&request.days)?;

        let child = Child {
            id: Self::generate_id(Utc::now().timestamp_millis()),
            name,
            school,
            address: request.address.trim().to_string(),
            fare_in,
            fare_out,
            days,
            color: request.color.unwrap_or_default(),
        };

        let (child, saved) = self.store.mutate::<_, StoreError>(&[StorageKey::Children], |store| {
            store.add_child(child.clone());
            Ok(child)
        })?;

        info!("Created child: {} with ID: {}", child.name, child.id);

        Ok(ChildResponse {
            child,
            saved,
            success_message: "Child added successfully".to_string(),
        })
    }

    pub fn get_child(&self, child_id: &str) -> Result<Option<Child>> {
        let child = self.store.read(|store| store.child(child_id).cloned());
        if child.is_none() {
            warn!("Child not found: {}", child_id);
        }
        Ok(child)
    }

    pub fn list_children(&self) -> Result<ChildListResponse> {
        let children = self.store.read(|store| store.children.clone());
        info!("Found {} children", children.len());
        Ok(ChildListResponse { children })
    }

    /// Distinct child names in alphabetical order
    pub fn unique_names(&self) -> UniqueNamesResponse {
        let names: BTreeSet<String> = self
            .store
            .read(|store| store.children.iter().map(|child| child.name.clone()).collect());
        UniqueNamesResponse {
            names: names.into_iter().collect(),
        }
    }

    pub fn child_statuses(&self, child_id: &str) -> Result<ChildStatusesResponse> {
        let statuses = self.store.read(|store| {
            store.child(child_id)?;
            Some(store.statuses.child_records(child_id).cloned().unwrap_or_default())
        });
        let statuses = statuses.ok_or_else(|| StoreError::ChildNotFound(child_id.to_string()))?;

        Ok(ChildStatusesResponse {
            child_id: child_id.to_string(),
            statuses,
        })
    }

    pub fn update_child(&self, child_id: &str, request: UpdateChildRequest) -> Result<ChildResponse> {
        info!("Updating child: {}", child_id);

        let changes = validate_update_request(request)?;
        let (child, saved) = self
            .store
            .mutate(&[StorageKey::Children], |store| store.update_child(child_id, changes))?;

        info!("Updated child: {} with ID: {}", child.name, child.id);

        Ok(ChildResponse {
            child,
            saved,
            success_message: "Child updated successfully".to_string(),
        })
    }

    /// Delete a child and its statuses; returns whether the change was saved
    pub fn delete_child(&self, child_id: &str) -> Result<bool> {
        info!("Deleting child: {}", child_id);

        let ((child, removed), saved) = self.store.mutate(
            &[StorageKey::Children, StorageKey::Statuses],
            |store| store.delete_child(child_id),
        )?;

        info!(
            "Deleted child: {} with ID: {} and {} status records",
            child.name, child.id, removed
        );
        Ok(saved)
    }
}

fn validate_text(
    value: &str,
    too_short: ChildValidationError,
    too_long: ChildValidationError,
) -> Result<String, ChildValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ChildValidationError::MissingNameOrSchool);
    }
    let len = value.chars().count();
    if len < MIN_TEXT_LEN {
        return Err(too_short);
    }
    if len > MAX_TEXT_LEN {
        return Err(too_long);
    }
    Ok(value.to_string())
}

fn validate_name(name: &str) -> Result<String, ChildValidationError> {
    validate_text(
        name,
        ChildValidationError::NameTooShort { min: MIN_TEXT_LEN },
        ChildValidationError::NameTooLong { max: MAX_TEXT_LEN },
    )
}

fn validate_school(school: &str) -> Result<String, ChildValidationError> {
    validate_text(
        school,
        ChildValidationError::SchoolTooShort { min: MIN_TEXT_LEN },
        ChildValidationError::SchoolTooLong { max: MAX_TEXT_LEN },
    )
}

/// Both fields are checked for presence before either is checked for length
fn validate_name_and_school(name: &str, school: &str) -> Result<(String, String), ChildValidationError> {
    if name.trim().is_empty() || school.trim().is_empty() {
        return Err(ChildValidationError::MissingNameOrSchool);
    }
    Ok((validate_name(name)?, validate_school(school)?))
}

fn validate_fare(fare: i64, field: &'static str) -> Result<u64, ChildValidationError> {
    if fare < 0 {
        return Err(if field == "fareOut" {
            ChildValidationError::NegativeFareOut
        } else {
            ChildValidationError::NegativeFareIn
        });
    }
    check_fare(fare as u64, field)
}

fn validate_days(days: &[u8]) -> Result<BTreeSet<u8>, ChildValidationError> {
    if days.is_empty() {
        return Err(ChildValidationError::NoServiceDays);
    }
    if let Some(day) = days.iter().find(|day| **day > 6) {
        return Err(ChildValidationError::InvalidWeekday(*day));
    }
    Ok(days.iter().copied().collect())
}

fn validate_update_request(request: UpdateChildRequest) -> Result<ChildChanges, ChildValidationError> {
    Ok(ChildChanges {
        name: request.name.as_deref().map(validate_name).transpose()?,
        school: request.school.as_deref().map(validate_school).transpose()?,
        address: request.address.map(|address| address.trim().to_string()),
        fare_in: request.fare_in.map(|fare| validate_fare(fare, "fareIn")).transpose()?,
        fare_out: request.fare_out.map(|fare| validate_fare(fare, "fareOut")).transpose()?,
        days: request.days.as_deref().map(validate_days).transpose()?,
        color: request.color,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::TestEnvironment;
    use chrono::NaiveDate;
    use shared::{ChildColor, StatusPatch};

    fn request(name: &str, school: &str) -> CreateChildRequest {
        CreateChildRequest {
            name: name.to_string(),
            school: school.to_string(),
            address: "Calle 1".to_string(),
            fare_in: Some(15000),
            fare_out: Some(12000),
            days: vec![1, 3, 5],
            color: Some(ChildColor::Orange),
        }
    }

    fn validation_error(err: anyhow::Error) -> ChildValidationError {
        err.downcast::<ChildValidationError>().expect("validation error")
    }

    #[test]
    fn test_create_child() {
        let env = TestEnvironment::new().unwrap();
        let service = ChildService::new(env.empty_store());

        let response = service.create_child(request("  Sofía González ", "Colegio Los Andes")).unwrap();
        assert!(response.saved);
        assert_eq!(response.child.name, "Sofía González");
        assert!(response.child.id.starts_with("child::"));
        assert_eq!(response.child.days, [1, 3, 5].into_iter().collect());
        assert_eq!(response.child.color, ChildColor::Orange);

        let listed = service.list_children().unwrap();
        assert_eq!(listed.children.len(), 1);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ChildService::generate_id(1_700_000_000_000);
        let b = ChildService::generate_id(1_700_000_000_000);
        assert_ne!(a, b);
        assert_eq!(a.len(), "child::1700000000000_".len() + 8);
    }

    #[test]
    fn test_create_child_validation() {
        let env = TestEnvironment::new().unwrap();
        let service = ChildService::new(env.empty_store());

        let err = validation_error(service.create_child(request("", "Colegio")).unwrap_err());
        assert_eq!(err, ChildValidationError::MissingNameOrSchool);

        let err = validation_error(service.create_child(request("Al", "Colegio")).unwrap_err());
        assert_eq!(err.field(), "name");

        let err = validation_error(service.create_child(request("Sofía", "CL")).unwrap_err());
        assert_eq!(err, ChildValidationError::SchoolTooShort { min: 3 });

        let mut negative = request("Sofía", "Colegio");
        negative.fare_out = Some(-1);
        let err = validation_error(service.create_child(negative).unwrap_err());
        assert_eq!(err, ChildValidationError::NegativeFareOut);

        let mut no_days = request("Sofía", "Colegio");
        no_days.days.clear();
        let err = validation_error(service.create_child(no_days).unwrap_err());
        assert_eq!(err, ChildValidationError::NoServiceDays);

        let mut bad_day = request("Sofía", "Colegio");
        bad_day.days = vec![1, 7];
        let err = validation_error(service.create_child(bad_day).unwrap_err());
        assert_eq!(err, ChildValidationError::InvalidWeekday(7));

        // Nothing was stored
        assert!(service.list_children().unwrap().children.is_empty());
    }

    #[test]
    fn test_missing_fares_default_to_zero() {
        let env = TestEnvironment::new().unwrap();
        let service = ChildService::new(env.empty_store());

        let mut req = request("Mateo", "San Marcos");
        req.fare_in = None;
        req.fare_out = None;
        let child = service.create_child(req).unwrap().child;
        assert_eq!((child.fare_in, child.fare_out), (0, 0));
    }

    #[test]
    fn test_update_child_partial() {
        let env = TestEnvironment::new().unwrap();
        let service = ChildService::new(env.empty_store());
        let child = service.create_child(request("Sofía", "Colegio Los Andes")).unwrap().child;

        let updated = service
            .update_child(
                &child.id,
                UpdateChildRequest { fare_in: Some(20000), ..Default::default() },
            )
            .unwrap()
            .child;
        assert_eq!(updated.fare_in, 20000);
        assert_eq!(updated.fare_out, 12000);
        assert_eq!(updated.name, "Sofía");

        let err = service
            .update_child(&child.id, UpdateChildRequest { days: Some(vec![]), ..Default::default() })
            .unwrap_err();
        assert_eq!(validation_error(err), ChildValidationError::NoServiceDays);

        let err = service
            .update_child("missing", UpdateChildRequest::default())
            .unwrap_err();
        assert!(err.downcast_ref::<StoreError>().is_some());
    }

    #[test]
    fn test_delete_child_removes_statuses() {
        let env = TestEnvironment::new().unwrap();
        let store = env.empty_store();
        let service = ChildService::new(store.clone());
        let child = service.create_child(request("Sofía", "Colegio Los Andes")).unwrap().child;
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        store
            .mutate(&[StorageKey::Statuses], |s| s.set_status(&child.id, day, StatusPatch::default()))
            .unwrap();
        assert_eq!(service.child_statuses(&child.id).unwrap().statuses.len(), 1);

        assert!(service.delete_child(&child.id).unwrap());
        assert!(store.read(|s| s.statuses.is_empty()));
        assert!(service.child_statuses(&child.id).is_err());
        assert!(service.delete_child(&child.id).is_err());
    }

    #[test]
    fn test_unique_names_sorted() {
        let env = TestEnvironment::new().unwrap();
        let service = ChildService::new(env.empty_store());
        service.create_child(request("Mateo", "San Marcos")).unwrap();
        service.create_child(request("Ana", "San Marcos")).unwrap();
        service.create_child(request("Mateo", "Los Andes")).unwrap();

        assert_eq!(service.unique_names().names, vec!["Ana".to_string(), "Mateo".to_string()]);
    }
}
