//! Employees and their shift plan.

use std::borrow::Cow;

use chrono::{NaiveDate, NaiveTime};
use models::{employee, shift};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::crud::{CrudService, Resource};
use crate::errors::ServiceError;
use crate::query::{Direction, Predicate, Query};
use crate::repository::{require, Repository, Store};
use crate::validation::{not_blank, ordered_range, positive_bound, positive_decimal, positive_range};

use super::ensure_unique;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmployeeRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(custom(function = "not_blank"))]
    pub employee_number: String,
    #[validate(custom(function = "not_blank"))]
    pub first_name: String,
    #[validate(custom(function = "not_blank"))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub position: String,
    #[validate(custom(function = "positive_decimal"))]
    pub hourly_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeResponse {
    pub id: Uuid,
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    pub hourly_rate: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct Employees;

#[async_trait::async_trait]
impl Resource for Employees {
    type Record = employee::Model;
    type Request = EmployeeRequest;
    type Response = EmployeeResponse;

    const PATH: &'static str = "employees";

    fn body_id(request: &EmployeeRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &EmployeeRequest) -> employee::Model {
        employee::Model {
            id,
            employee_number: r.employee_number.trim().to_string(),
            first_name: r.first_name.trim().to_string(),
            last_name: r.last_name.trim().to_string(),
            email: r.email.trim().to_lowercase(),
            position: r.position.trim().to_string(),
            hourly_rate: r.hourly_rate,
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: employee::Model, now: DateTimeWithTimeZone, r: &EmployeeRequest) -> employee::Model {
        employee::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: employee::Model) -> EmployeeResponse {
        EmployeeResponse {
            id: m.id,
            employee_number: m.employee_number,
            first_name: m.first_name,
            last_name: m.last_name,
            email: m.email,
            position: m.position,
            hourly_rate: m.hourly_rate,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &EmployeeRequest, current: Option<Uuid>) -> Result<(), ServiceError> {
        ensure_unique::<employee::Model, U>(
            repo,
            employee::Column::EmployeeNumber,
            r.employee_number.trim().into(),
            "employee number",
            current,
        )
        .await
    }

    async fn before_delete<U: Repository>(repo: &U, record: &employee::Model) -> Result<(), ServiceError> {
        let planned = repo
            .find_first(Query::<shift::Model>::new().filter(Predicate::eq(shift::Column::EmployeeId, record.id)))
            .await?;
        if planned.is_some() {
            return Err(ServiceError::Conflict(format!("employee {} still has shifts", record.employee_number)));
        }
        Ok(())
    }
}

pub type EmployeeService<S> = CrudService<Employees, S>;

impl<S: Store> CrudService<Employees, S> {
    pub async fn find_by_employee_number(&self, number: &str) -> Result<EmployeeResponse, ServiceError> {
        self.find_single(
            Query::new().filter(Predicate::eq(employee::Column::EmployeeNumber, number.trim().to_string())),
            number,
        )
        .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Vec<EmployeeResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(employee::Column::Email, email.trim().to_lowercase()))).await
    }

    pub async fn find_by_last_name(&self, fragment: &str) -> Result<Vec<EmployeeResponse>, ServiceError> {
        self.find_by(
            Query::new()
                .filter(Predicate::contains(employee::Column::LastName, fragment))
                .order_by(employee::Column::LastName, Direction::Asc),
        )
        .await
    }

    pub async fn find_by_position(&self, fragment: &str) -> Result<Vec<EmployeeResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::contains(employee::Column::Position, fragment))).await
    }

    pub async fn find_by_hourly_rate_greater_than(&self, min: Decimal) -> Result<Vec<EmployeeResponse>, ServiceError> {
        let min = positive_bound("hourly_rate", min)?;
        self.find_by(Query::new().filter(Predicate::gt(employee::Column::HourlyRate, min))).await
    }

    pub async fn find_by_hourly_rate_between(&self, low: Decimal, high: Decimal) -> Result<Vec<EmployeeResponse>, ServiceError> {
        let (low, high) = positive_range("hourly_rate", low, high)?;
        self.find_by(
            Query::new()
                .filter(Predicate::between(employee::Column::HourlyRate, low, high))
                .order_by(employee::Column::HourlyRate, Direction::Asc),
        )
        .await
    }
}

fn starts_before_end(r: &ShiftRequest) -> Result<(), ValidationError> {
    if r.start_time >= r.end_time {
        return Err(ValidationError::new("end_time").with_message(Cow::Borrowed("shift must end after it starts")));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "starts_before_end"))]
pub struct ShiftRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub employee_id: Uuid,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftResponse {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct Shifts;

#[async_trait::async_trait]
impl Resource for Shifts {
    type Record = shift::Model;
    type Request = ShiftRequest;
    type Response = ShiftResponse;

    const PATH: &'static str = "shifts";

    fn body_id(request: &ShiftRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &ShiftRequest) -> shift::Model {
        shift::Model {
            id,
            employee_id: r.employee_id,
            shift_date: r.shift_date,
            start_time: r.start_time,
            end_time: r.end_time,
            notes: r.notes.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: shift::Model, now: DateTimeWithTimeZone, r: &ShiftRequest) -> shift::Model {
        shift::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: shift::Model) -> ShiftResponse {
        ShiftResponse {
            id: m.id,
            employee_id: m.employee_id,
            shift_date: m.shift_date,
            start_time: m.start_time,
            end_time: m.end_time,
            notes: m.notes,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &ShiftRequest, _current: Option<Uuid>) -> Result<(), ServiceError> {
        require::<employee::Model, U>(repo, r.employee_id).await?;
        Ok(())
    }
}

pub type ShiftService<S> = CrudService<Shifts, S>;

impl<S: Store> CrudService<Shifts, S> {
    pub async fn find_by_employee(&self, employee_id: Uuid) -> Result<Vec<ShiftResponse>, ServiceError> {
        self.find_by(
            Query::new()
                .filter(Predicate::eq(shift::Column::EmployeeId, employee_id))
                .order_by(shift::Column::ShiftDate, Direction::Asc),
        )
        .await
    }

    pub async fn find_by_employee_number(&self, number: &str) -> Result<Vec<ShiftResponse>, ServiceError> {
        self.find_related(
            Query::<employee::Model>::new()
                .filter(Predicate::eq(employee::Column::EmployeeNumber, number.trim().to_string())),
            shift::Column::EmployeeId,
        )
        .await
    }

    pub async fn find_by_shift_date(&self, day: NaiveDate) -> Result<Vec<ShiftResponse>, ServiceError> {
        self.find_by(
            Query::new()
                .filter(Predicate::eq(shift::Column::ShiftDate, day))
                .order_by(shift::Column::StartTime, Direction::Asc),
        )
        .await
    }

    pub async fn find_by_shift_date_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ShiftResponse>, ServiceError> {
        let (from, to) = ordered_range("shift_date", from, to)?;
        self.find_by(
            Query::new()
                .filter(Predicate::between(shift::Column::ShiftDate, from, to))
                .order_by(shift::Column::ShiftDate, Direction::Asc),
        )
        .await
    }

    /// Shifts starting at or after `time`, on any day.
    pub async fn find_starting_from(&self, time: NaiveTime) -> Result<Vec<ShiftResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::gte(shift::Column::StartTime, time))).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::resources::fixtures::{actor, date, store};
    use crate::store::MemoryStore;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
    }

    fn employee(number: &str, last_name: &str) -> EmployeeRequest {
        EmployeeRequest {
            id: None,
            employee_number: number.into(),
            first_name: "Sam".into(),
            last_name: last_name.into(),
            email: format!("{}@Plant.example", number.to_lowercase()),
            position: "Machine Operator".into(),
            hourly_rate: Decimal::new(2350, 2),
        }
    }

    async fn hire(store: &Arc<MemoryStore>, number: &str) -> Result<EmployeeResponse, ServiceError> {
        EmployeeService::new(store.clone()).create(&actor(), employee(number, "Doe")).await
    }

    fn shift(employee_id: Uuid, day: u32, start: NaiveTime, end: NaiveTime) -> ShiftRequest {
        ShiftRequest { id: None, employee_id, shift_date: date(2024, 6, day), start_time: start, end_time: end, notes: None }
    }

    #[tokio::test]
    async fn employee_rules() -> Result<(), ServiceError> {
        let store = store();
        let svc = EmployeeService::new(store.clone());
        let e = svc.create(&actor(), employee("E-100", "Nakamura")).await?;
        assert_eq!(e.email, "e-100@plant.example");

        let dup = svc.create(&actor(), employee("E-100", "Other")).await.unwrap_err();
        assert!(matches!(dup, ServiceError::Conflict(_)));

        let mut bad = employee("E-101", "Zero");
        bad.hourly_rate = Decimal::ZERO;
        assert!(matches!(svc.create(&actor(), bad).await, Err(ServiceError::Validation(_))));

        assert_eq!(svc.find_by_employee_number("E-100").await?.id, e.id);
        assert_eq!(svc.find_by_last_name("naka").await?.len(), 1);
        assert!(svc.find_by_hourly_rate_greater_than(Decimal::new(30, 0)).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn shift_must_end_after_start() -> Result<(), ServiceError> {
        let store = store();
        let e = hire(&store, "E-1").await?;
        store.reset_calls();
        let err = ShiftService::new(store.clone())
            .create(&actor(), shift(e.id, 3, at(14, 0), at(6, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.touches("shift"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn shift_for_unknown_employee_is_not_found() {
        let err = ShiftService::new(store())
            .create(&actor(), shift(Uuid::new_v4(), 3, at(6, 0), at(14, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.missing_entity(), Some("employee"));
    }

    #[tokio::test]
    async fn shift_finders_and_delete_guard() -> Result<(), ServiceError> {
        let store = store();
        let e = hire(&store, "E-7").await?;
        let shifts = ShiftService::new(store.clone());
        let early = shifts.create(&actor(), shift(e.id, 3, at(6, 0), at(14, 0))).await?;
        let late = shifts.create(&actor(), shift(e.id, 4, at(14, 0), at(22, 0))).await?;

        assert_eq!(shifts.find_by_employee_number("E-7").await?.len(), 2);
        assert_eq!(shifts.find_by_shift_date(date(2024, 6, 3)).await?[0].id, early.id);
        assert_eq!(shifts.find_starting_from(at(12, 0)).await?[0].id, late.id);
        assert!(shifts.find_by_shift_date_between(date(2024, 6, 5), date(2024, 6, 1)).await.is_err());

        let employees = EmployeeService::new(store.clone());
        assert!(matches!(employees.delete(&actor(), e.id).await, Err(ServiceError::Conflict(_))));
        shifts.delete(&actor(), early.id).await?;
        shifts.delete(&actor(), late.id).await?;
        employees.delete(&actor(), e.id).await?;
        Ok(())
    }
}
