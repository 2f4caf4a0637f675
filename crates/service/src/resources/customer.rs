use models::customer::{self, Column};
use models::sales_order;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::crud::{CrudService, Resource};
use crate::errors::ServiceError;
use crate::query::{Predicate, Query};
use crate::repository::{Repository, Store};
use crate::validation::not_blank;

use super::ensure_unique;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CustomerRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct Customers;

#[async_trait::async_trait]
impl Resource for Customers {
    type Record = customer::Model;
    type Request = CustomerRequest;
    type Response = CustomerResponse;

    const PATH: &'static str = "customers";

    fn body_id(request: &CustomerRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &CustomerRequest) -> customer::Model {
        customer::Model {
            id,
            name: r.name.trim().to_string(),
            email: r.email.trim().to_lowercase(),
            phone: r.phone.clone(),
            address: r.address.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: customer::Model, now: DateTimeWithTimeZone, r: &CustomerRequest) -> customer::Model {
        customer::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: customer::Model) -> CustomerResponse {
        CustomerResponse {
            id: m.id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            address: m.address,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &CustomerRequest, current: Option<Uuid>) -> Result<(), ServiceError> {
        ensure_unique::<customer::Model, U>(repo, Column::Email, r.email.trim().to_lowercase().into(), "email", current).await
    }

    /// Orders keep a required reference to their customer.
    async fn before_delete<U: Repository>(repo: &U, record: &customer::Model) -> Result<(), ServiceError> {
        let orders = repo
            .find_first(Query::<sales_order::Model>::new().filter(Predicate::eq(sales_order::Column::CustomerId, record.id)))
            .await?;
        if orders.is_some() {
            return Err(ServiceError::Conflict(format!("customer {} still has sales orders", record.id)));
        }
        Ok(())
    }
}

pub type CustomerService<S> = CrudService<Customers, S>;

impl<S: Store> CrudService<Customers, S> {
    pub async fn find_by_email(&self, email: &str) -> Result<CustomerResponse, ServiceError> {
        let email = email.trim().to_lowercase();
        self.find_single(Query::new().filter(Predicate::eq(Column::Email, email.clone())), email).await
    }

    pub async fn find_by_name(&self, fragment: &str) -> Result<Vec<CustomerResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::contains(Column::Name, fragment))).await
    }

    pub async fn find_by_address(&self, fragment: &str) -> Result<Vec<CustomerResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::contains(Column::Address, fragment))).await
    }

    pub async fn find_without_phone(&self) -> Result<Vec<CustomerResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::is_null(Column::Phone))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::fixtures::{actor, store};

    fn request(name: &str, email: &str) -> CustomerRequest {
        CustomerRequest { id: None, name: name.into(), email: email.into(), phone: None, address: Some("1 Main St, Springfield".into()) }
    }

    #[tokio::test]
    async fn invalid_email_and_blank_name_fail_validation() {
        let svc = CustomerService::new(store());
        assert!(matches!(
            svc.create(&actor(), request("Acme", "not-an-email")).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(svc.create(&actor(), request("  ", "a@b.com")).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn finders_cover_email_name_and_null_phone() -> Result<(), ServiceError> {
        let svc = CustomerService::new(store());
        let acme = svc.create(&actor(), request("Acme Corp", "Sales@Acme.test")).await?;
        let mut other = request("Globex", "info@globex.test");
        other.phone = Some("+1 555 0100".into());
        svc.create(&actor(), other).await?;

        assert_eq!(svc.find_by_email("sales@acme.test").await?.id, acme.id);
        assert_eq!(svc.find_by_name("CORP").await?.len(), 1);
        assert_eq!(svc.find_by_address("springfield").await?.len(), 2);
        let no_phone = svc.find_without_phone().await?;
        assert_eq!(no_phone.len(), 1);
        assert_eq!(no_phone[0].id, acme.id);
        assert!(svc.find_by_name("initech").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn email_is_unique_regardless_of_case() -> Result<(), ServiceError> {
        let svc = CustomerService::new(store());
        let first = svc.create(&actor(), request("Acme", "x@example.com")).await?;
        assert!(matches!(
            svc.create(&actor(), request("Acme Two", "X@Example.com")).await,
            Err(ServiceError::Conflict(_))
        ));
        let mut same = request("Acme Renamed", "X@EXAMPLE.COM");
        same.id = Some(first.id);
        assert_eq!(svc.update(&actor(), first.id, same).await?.name, "Acme Renamed");
        assert_eq!(svc.find_all(None).await?.len(), 1);
        Ok(())
    }
}
