//! Sales orders and the invoices that bill them.
//!
//! The link is owned by `sales_order.invoice_id`. An order belongs to at most
//! one invoice; invoice writes keep the set of linked orders equal to the
//! request's `sales_order_ids`.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use models::enums::{AuditAction, InvoiceStatus, OrderStatus};
use models::{customer, invoice, sales_order, shipment, Record};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::audit::{now, record_event, Actor};
use crate::crud::{observe, CrudService, Resource};
use crate::errors::ServiceError;
use crate::mail::{dispatch, MailError, Mailer};
use crate::query::{Direction, Predicate, Query};
use crate::repository::{finish, require, Repository, Store};
use crate::validation::{not_blank, ordered_range, positive_bound, positive_decimal, positive_range};

use super::{ensure_unique, require_all};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SalesOrderRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(custom(function = "not_blank"))]
    pub order_number: String,
    pub customer_id: Uuid,
    pub order_date: NaiveDate,
    #[validate(custom(function = "positive_decimal"))]
    pub total_amount: Decimal,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub order_date: NaiveDate,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct SalesOrders;

#[async_trait::async_trait]
impl Resource for SalesOrders {
    type Record = sales_order::Model;
    type Request = SalesOrderRequest;
    type Response = SalesOrderResponse;

    const PATH: &'static str = "sales-orders";

    fn body_id(request: &SalesOrderRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &SalesOrderRequest) -> sales_order::Model {
        sales_order::Model {
            id,
            order_number: r.order_number.trim().to_string(),
            customer_id: r.customer_id,
            invoice_id: None,
            order_date: r.order_date,
            total_amount: r.total_amount,
            status: r.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// The invoice link is maintained from the invoice side and survives overwrites.
    fn overwrite(existing: sales_order::Model, now: DateTimeWithTimeZone, r: &SalesOrderRequest) -> sales_order::Model {
        sales_order::Model {
            invoice_id: existing.invoice_id,
            created_at: existing.created_at,
            ..Self::create(existing.id, now, r)
        }
    }

    fn to_response(m: sales_order::Model) -> SalesOrderResponse {
        SalesOrderResponse {
            id: m.id,
            order_number: m.order_number,
            customer_id: m.customer_id,
            invoice_id: m.invoice_id,
            order_date: m.order_date,
            total_amount: m.total_amount,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &SalesOrderRequest, current: Option<Uuid>) -> Result<(), ServiceError> {
        require::<customer::Model, U>(repo, r.customer_id).await?;
        ensure_unique::<sales_order::Model, U>(
            repo,
            sales_order::Column::OrderNumber,
            r.order_number.trim().into(),
            "order number",
            current,
        )
        .await
    }

    async fn before_delete<U: Repository>(repo: &U, record: &sales_order::Model) -> Result<(), ServiceError> {
        let shipped = repo
            .find_first(Query::<shipment::Model>::new().filter(Predicate::eq(shipment::Column::SalesOrderId, record.id)))
            .await?;
        if shipped.is_some() {
            return Err(ServiceError::Conflict(format!("sales order {} has shipments", record.id)));
        }
        Ok(())
    }
}

pub type SalesOrderService<S> = CrudService<SalesOrders, S>;

impl<S: Store> CrudService<SalesOrders, S> {
    pub async fn find_by_order_number(&self, number: &str) -> Result<SalesOrderResponse, ServiceError> {
        self.find_single(
            Query::new().filter(Predicate::eq(sales_order::Column::OrderNumber, number.trim().to_string())),
            number,
        )
        .await
    }

    pub async fn find_by_customer(&self, customer_id: Uuid) -> Result<Vec<SalesOrderResponse>, ServiceError> {
        self.find_by(
            Query::new()
                .filter(Predicate::eq(sales_order::Column::CustomerId, customer_id))
                .order_by(sales_order::Column::OrderDate, Direction::Asc),
        )
        .await
    }

    /// Orders of every customer whose name contains `fragment`.
    pub async fn find_by_customer_name(&self, fragment: &str) -> Result<Vec<SalesOrderResponse>, ServiceError> {
        self.find_related(
            Query::<customer::Model>::new().filter(Predicate::contains(customer::Column::Name, fragment)),
            sales_order::Column::CustomerId,
        )
        .await
    }

    pub async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<SalesOrderResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(sales_order::Column::Status, status))).await
    }

    pub async fn find_by_total_greater_than(&self, min: Decimal) -> Result<Vec<SalesOrderResponse>, ServiceError> {
        let min = positive_bound("total_amount", min)?;
        self.find_by(Query::new().filter(Predicate::gt(sales_order::Column::TotalAmount, min))).await
    }

    pub async fn find_by_total_between(&self, low: Decimal, high: Decimal) -> Result<Vec<SalesOrderResponse>, ServiceError> {
        let (low, high) = positive_range("total_amount", low, high)?;
        self.find_by(Query::new().filter(Predicate::between(sales_order::Column::TotalAmount, low, high))).await
    }

    pub async fn find_by_order_date_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<SalesOrderResponse>, ServiceError> {
        let (from, to) = ordered_range("order_date", from, to)?;
        self.find_by(Query::new().filter(Predicate::between(sales_order::Column::OrderDate, from, to))).await
    }

    pub async fn find_unbilled(&self) -> Result<Vec<SalesOrderResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::is_null(sales_order::Column::InvoiceId))).await
    }
}

fn due_after_issue(r: &InvoiceRequest) -> Result<(), ValidationError> {
    if r.due_date < r.issue_date {
        return Err(ValidationError::new("due_date").with_message(Cow::Borrowed("due date precedes issue date")));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "due_after_issue"))]
pub struct InvoiceRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(custom(function = "not_blank"))]
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[validate(custom(function = "positive_decimal"))]
    pub amount: Decimal,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub sales_order_ids: Vec<Uuid>,
}

impl InvoiceRequest {
    fn order_ids(&self) -> BTreeSet<Uuid> {
        self.sales_order_ids.iter().copied().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub status: InvoiceStatus,
    pub sales_order_ids: Vec<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub struct Invoices;

async fn linked_orders<U: Repository>(repo: &U, invoice_id: Uuid) -> Result<Vec<sales_order::Model>, ServiceError> {
    repo.find(
        Query::new()
            .filter(Predicate::eq(sales_order::Column::InvoiceId, invoice_id))
            .order_by(sales_order::Column::OrderNumber, Direction::Asc),
    )
    .await
}

async fn set_invoice<U: Repository>(
    repo: &U,
    order: sales_order::Model,
    invoice_id: Option<Uuid>,
) -> Result<sales_order::Model, ServiceError> {
    repo.update(sales_order::Model { invoice_id, updated_at: now(), ..order }).await
}

fn claimed_elsewhere(order: &sales_order::Model, invoice_id: Option<Uuid>) -> bool {
    order.invoice_id.is_some() && order.invoice_id != invoice_id
}

#[async_trait::async_trait]
impl Resource for Invoices {
    type Record = invoice::Model;
    type Request = InvoiceRequest;
    type Response = InvoiceResponse;

    const PATH: &'static str = "invoices";

    fn body_id(request: &InvoiceRequest) -> Option<Uuid> {
        request.id
    }

    fn create(id: Uuid, now: DateTimeWithTimeZone, r: &InvoiceRequest) -> invoice::Model {
        invoice::Model {
            id,
            invoice_number: r.invoice_number.trim().to_string(),
            issue_date: r.issue_date,
            due_date: r.due_date,
            amount: r.amount,
            status: r.status,
            created_at: now,
            updated_at: now,
        }
    }

    fn overwrite(existing: invoice::Model, now: DateTimeWithTimeZone, r: &InvoiceRequest) -> invoice::Model {
        invoice::Model { created_at: existing.created_at, ..Self::create(existing.id, now, r) }
    }

    fn to_response(m: invoice::Model) -> InvoiceResponse {
        InvoiceResponse {
            id: m.id,
            invoice_number: m.invoice_number,
            issue_date: m.issue_date,
            due_date: m.due_date,
            amount: m.amount,
            status: m.status,
            sales_order_ids: Vec::new(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    async fn resolve<U: Repository>(repo: &U, r: &InvoiceRequest, current: Option<Uuid>) -> Result<(), ServiceError> {
        ensure_unique::<invoice::Model, U>(
            repo,
            invoice::Column::InvoiceNumber,
            r.invoice_number.trim().into(),
            "invoice number",
            current,
        )
        .await?;
        let ids: Vec<Uuid> = r.order_ids().into_iter().collect();
        for order in require_all::<sales_order::Model, U>(repo, &ids).await? {
            if claimed_elsewhere(&order, current) {
                return Err(ServiceError::Conflict(format!(
                    "sales order {} is already invoiced",
                    order.order_number
                )));
            }
        }
        Ok(())
    }

    async fn after_write<U: Repository>(repo: &U, record: &invoice::Model, r: &InvoiceRequest) -> Result<(), ServiceError> {
        let wanted = r.order_ids();
        let mut present = BTreeSet::new();
        for order in linked_orders(repo, record.id).await? {
            if wanted.contains(&order.id) {
                present.insert(order.id);
            } else {
                set_invoice(repo, order, None).await?;
            }
        }
        for id in wanted.difference(&present) {
            let order = require::<sales_order::Model, U>(repo, *id).await?;
            set_invoice(repo, order, Some(record.id)).await?;
        }
        Ok(())
    }

    async fn before_delete<U: Repository>(repo: &U, record: &invoice::Model) -> Result<(), ServiceError> {
        for order in linked_orders(repo, record.id).await? {
            set_invoice(repo, order, None).await?;
        }
        Ok(())
    }

    async fn enrich<U: Repository>(repo: &U, response: &mut InvoiceResponse) -> Result<(), ServiceError> {
        response.sales_order_ids = linked_orders(repo, response.id).await?.into_iter().map(|o| o.id).collect();
        Ok(())
    }
}

pub type InvoiceService<S> = CrudService<Invoices, S>;

impl<S: Store> CrudService<Invoices, S> {
    /// Link one more order. Fails when the order belongs to another invoice.
    #[instrument(skip(self), fields(actor = %actor))]
    pub async fn attach_sales_order(
        &self,
        actor: &Actor,
        invoice_id: Uuid,
        order_id: Uuid,
    ) -> Result<InvoiceResponse, ServiceError> {
        let outcome = async {
            let uow = self.store().begin().await?;
            let outcome = async {
                let invoice = require::<invoice::Model, _>(&uow, invoice_id).await?;
                let order = require::<sales_order::Model, _>(&uow, order_id).await?;
                if claimed_elsewhere(&order, Some(invoice_id)) {
                    return Err(ServiceError::Conflict(format!("sales order {} is already invoiced", order.order_number)));
                }
                if order.invoice_id.is_none() {
                    set_invoice(&uow, order, Some(invoice_id)).await?;
                    record_event(
                        &uow,
                        actor,
                        AuditAction::Update,
                        invoice::Model::NAME,
                        Some(invoice_id),
                        Some(format!("attached sales order {order_id}")),
                    )
                    .await?;
                }
                Self::respond(&uow, invoice).await
            }
            .await;
            finish(uow, outcome).await
        }
        .await;
        observe(invoice::Model::NAME, "attach_sales_order", outcome)
    }

    #[instrument(skip(self), fields(actor = %actor))]
    pub async fn detach_sales_order(
        &self,
        actor: &Actor,
        invoice_id: Uuid,
        order_id: Uuid,
    ) -> Result<InvoiceResponse, ServiceError> {
        let outcome = async {
            let uow = self.store().begin().await?;
            let outcome = async {
                let invoice = require::<invoice::Model, _>(&uow, invoice_id).await?;
                let order = require::<sales_order::Model, _>(&uow, order_id).await?;
                if order.invoice_id != Some(invoice_id) {
                    return Err(ServiceError::validation(format!(
                        "sales order {} is not linked to invoice {}",
                        order.order_number, invoice.invoice_number
                    )));
                }
                set_invoice(&uow, order, None).await?;
                record_event(
                    &uow,
                    actor,
                    AuditAction::Update,
                    invoice::Model::NAME,
                    Some(invoice_id),
                    Some(format!("detached sales order {order_id}")),
                )
                .await?;
                Self::respond(&uow, invoice).await
            }
            .await;
            finish(uow, outcome).await
        }
        .await;
        observe(invoice::Model::NAME, "detach_sales_order", outcome)
    }

    /// Orders billed by an invoice; the invoice itself must exist.
    pub async fn find_sales_orders(&self, invoice_id: Uuid) -> Result<Vec<SalesOrderResponse>, ServiceError> {
        let outcome = async {
            let uow = self.store().begin().await?;
            let outcome = async {
                require::<invoice::Model, _>(&uow, invoice_id).await?;
                let orders = linked_orders(&uow, invoice_id).await?;
                Ok(orders.into_iter().map(SalesOrders::to_response).collect())
            }
            .await;
            finish(uow, outcome).await
        }
        .await;
        observe(invoice::Model::NAME, "find_sales_orders", outcome)
    }

    /// Create the invoice, then mail every distinct customer of its orders.
    /// Sends run detached; the handles report delivery.
    pub async fn issue_and_notify(
        &self,
        actor: &Actor,
        request: InvoiceRequest,
        mailer: Arc<dyn Mailer>,
    ) -> Result<(InvoiceResponse, Vec<JoinHandle<Result<(), MailError>>>), ServiceError> {
        let created = self.create(actor, request).await?;

        let uow = self.store().begin().await?;
        let outcome = async {
            let mut recipients = BTreeSet::new();
            for order_id in &created.sales_order_ids {
                let order = require::<sales_order::Model, _>(&uow, *order_id).await?;
                let customer = require::<customer::Model, _>(&uow, order.customer_id).await?;
                recipients.insert(customer.email);
            }
            Ok(recipients)
        }
        .await;
        let recipients = finish(uow, outcome).await?;

        let subject = format!("Invoice {}", created.invoice_number);
        let body = format!(
            "Invoice {} over {} was issued on {} and is due on {}.",
            created.invoice_number, created.amount, created.issue_date, created.due_date
        );
        let handles = recipients
            .into_iter()
            .map(|to| dispatch(mailer.clone(), to, subject.clone(), body.clone()))
            .collect::<Vec<_>>();
        info!(invoice = %created.id, notified = handles.len(), "invoice_issued");
        Ok((created, handles))
    }

    pub async fn find_by_invoice_number(&self, number: &str) -> Result<InvoiceResponse, ServiceError> {
        self.find_single(
            Query::new().filter(Predicate::eq(invoice::Column::InvoiceNumber, number.trim().to_string())),
            number,
        )
        .await
    }

    pub async fn find_by_status(&self, status: InvoiceStatus) -> Result<Vec<InvoiceResponse>, ServiceError> {
        self.find_by(Query::new().filter(Predicate::eq(invoice::Column::Status, status))).await
    }

    pub async fn find_by_amount_greater_than(&self, min: Decimal) -> Result<Vec<InvoiceResponse>, ServiceError> {
        let min = positive_bound("amount", min)?;
        self.find_by(Query::new().filter(Predicate::gt(invoice::Column::Amount, min))).await
    }

    pub async fn find_by_amount_between(&self, low: Decimal, high: Decimal) -> Result<Vec<InvoiceResponse>, ServiceError> {
        let (low, high) = positive_range("amount", low, high)?;
        self.find_by(Query::new().filter(Predicate::between(invoice::Column::Amount, low, high))).await
    }

    pub async fn find_by_issue_date_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<InvoiceResponse>, ServiceError> {
        let (from, to) = ordered_range("issue_date", from, to)?;
        self.find_by(Query::new().filter(Predicate::between(invoice::Column::IssueDate, from, to))).await
    }

    /// Unpaid invoices whose due date is before `today`.
    pub async fn find_overdue(&self, today: NaiveDate) -> Result<Vec<InvoiceResponse>, ServiceError> {
        self.find_by(
            Query::new()
                .filter(Predicate::lt(invoice::Column::DueDate, today))
                .filter(Predicate::ne(invoice::Column::Status, InvoiceStatus::Paid))
                .filter(Predicate::ne(invoice::Column::Status, InvoiceStatus::Cancelled))
                .order_by(invoice::Column::DueDate, Direction::Asc),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::OutboxMailer;
    use crate::resources::customer::{CustomerRequest, CustomerService};
    use crate::resources::fixtures::{actor, date, store};
    use crate::store::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        orders: SalesOrderService<MemoryStore>,
        invoices: InvoiceService<MemoryStore>,
        customer: Uuid,
    }

    async fn fixture() -> Result<Fixture, ServiceError> {
        let store = store();
        let customer = CustomerService::new(store.clone())
            .create(
                &actor(),
                CustomerRequest {
                    id: None,
                    name: "Initech".into(),
                    email: "billing@initech.test".into(),
                    phone: None,
                    address: None,
                },
            )
            .await?;
        Ok(Fixture {
            orders: SalesOrderService::new(store.clone()),
            invoices: InvoiceService::new(store.clone()),
            store,
            customer: customer.id,
        })
    }

    fn order(customer_id: Uuid, number: &str) -> SalesOrderRequest {
        SalesOrderRequest {
            id: None,
            order_number: number.into(),
            customer_id,
            order_date: date(2024, 4, 2),
            total_amount: Decimal::new(500, 0),
            status: OrderStatus::Confirmed,
        }
    }

    fn invoice(number: &str, orders: Vec<Uuid>) -> InvoiceRequest {
        InvoiceRequest {
            id: None,
            invoice_number: number.into(),
            issue_date: date(2024, 4, 3),
            due_date: date(2024, 5, 3),
            amount: Decimal::new(500, 0),
            status: InvoiceStatus::Issued,
            sales_order_ids: orders,
        }
    }

    #[tokio::test]
    async fn order_with_unknown_customer_is_not_found() {
        let svc = SalesOrderService::new(store());
        let err = svc.create(&actor(), order(Uuid::new_v4(), "SO-1")).await.unwrap_err();
        assert_eq!(err.missing_entity(), Some("customer"));
    }

    #[tokio::test]
    async fn order_number_is_unique() -> Result<(), ServiceError> {
        let f = fixture().await?;
        let first = f.orders.create(&actor(), order(f.customer, "SO-1")).await?;
        assert!(matches!(
            f.orders.create(&actor(), order(f.customer, " SO-1 ")).await,
            Err(ServiceError::Conflict(_))
        ));
        let mut same = order(f.customer, "SO-1");
        same.id = Some(first.id);
        f.orders.update(&actor(), first.id, same).await?;
        assert_eq!(f.orders.find_by_order_number("SO-1").await?.id, first.id);
        assert_eq!(f.store.len::<sales_order::Model>(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn invoice_links_and_relinks_orders() -> Result<(), ServiceError> {
        let f = fixture().await?;
        let a = f.orders.create(&actor(), order(f.customer, "SO-A")).await?;
        let b = f.orders.create(&actor(), order(f.customer, "SO-B")).await?;

        let inv = f.invoices.create(&actor(), invoice("INV-1", vec![a.id])).await?;
        assert_eq!(inv.sales_order_ids, vec![a.id]);
        assert_eq!(f.orders.find_one(a.id).await?.invoice_id, Some(inv.id));

        let mut req = invoice("INV-1", vec![b.id]);
        req.id = Some(inv.id);
        let inv = f.invoices.update(&actor(), inv.id, req).await?;
        assert_eq!(inv.sales_order_ids, vec![b.id]);
        assert_eq!(f.orders.find_one(a.id).await?.invoice_id, None);
        assert_eq!(f.orders.find_unbilled().await?.len(), 1);

        f.invoices.delete(&actor(), inv.id).await?;
        assert_eq!(f.orders.find_one(b.id).await?.invoice_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn order_cannot_belong_to_two_invoices() -> Result<(), ServiceError> {
        let f = fixture().await?;
        let a = f.orders.create(&actor(), order(f.customer, "SO-A")).await?;
        f.invoices.create(&actor(), invoice("INV-1", vec![a.id])).await?;

        let err = f.invoices.create(&actor(), invoice("INV-2", vec![a.id])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(f.store.len::<invoice::Model>(), 1);

        let missing = f.invoices.create(&actor(), invoice("INV-3", vec![Uuid::new_v4()])).await.unwrap_err();
        assert_eq!(missing.missing_entity(), Some("sales order"));
        Ok(())
    }

    #[tokio::test]
    async fn attach_and_detach_single_orders() -> Result<(), ServiceError> {
        let f = fixture().await?;
        let a = f.orders.create(&actor(), order(f.customer, "SO-A")).await?;
        let inv = f.invoices.create(&actor(), invoice("INV-1", vec![])).await?;

        let attached_before = common::metrics::operation_count("invoice", "attach_sales_order", true);
        let conflicts_before = common::metrics::operation_count("invoice", "attach_sales_order", false);
        let linked = f.invoices.attach_sales_order(&actor(), inv.id, a.id).await?;
        assert_eq!(linked.sales_order_ids, vec![a.id]);
        assert!(common::metrics::operation_count("invoice", "attach_sales_order", true) > attached_before);
        assert_eq!(f.invoices.find_sales_orders(inv.id).await?.len(), 1);

        let other = f.invoices.create(&actor(), invoice("INV-2", vec![])).await?;
        assert!(matches!(
            f.invoices.attach_sales_order(&actor(), other.id, a.id).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(common::metrics::operation_count("invoice", "attach_sales_order", false) > conflicts_before);
        assert!(matches!(
            f.invoices.detach_sales_order(&actor(), other.id, a.id).await,
            Err(ServiceError::Validation(_))
        ));

        let unlinked = f.invoices.detach_sales_order(&actor(), inv.id, a.id).await?;
        assert!(unlinked.sales_order_ids.is_empty());
        let err = f.invoices.find_sales_orders(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.missing_entity(), Some("invoice"));
        Ok(())
    }

    #[tokio::test]
    async fn due_date_before_issue_date_is_invalid() {
        let svc = InvoiceService::new(store());
        let mut req = invoice("INV-1", vec![]);
        req.due_date = date(2024, 1, 1);
        assert!(matches!(svc.create(&actor(), req).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn issuing_mails_the_customer_once() -> Result<(), ServiceError> {
        let f = fixture().await?;
        let a = f.orders.create(&actor(), order(f.customer, "SO-A")).await?;
        let b = f.orders.create(&actor(), order(f.customer, "SO-B")).await?;
        let outbox = OutboxMailer::new();

        let (inv, handles) = f
            .invoices
            .issue_and_notify(&actor(), invoice("INV-9", vec![a.id, b.id]), Arc::new(outbox.clone()))
            .await?;
        assert_eq!(handles.len(), 1);
        for h in handles {
            assert!(matches!(h.await, Ok(Ok(()))));
        }
        let sent = outbox.sent();
        assert_eq!(sent[0].to, "billing@initech.test");
        assert!(sent[0].subject.contains(&inv.invoice_number));
        Ok(())
    }

    #[tokio::test]
    async fn overdue_excludes_paid_invoices() -> Result<(), ServiceError> {
        let f = fixture().await?;
        f.invoices.create(&actor(), invoice("INV-1", vec![])).await?;
        let mut paid = invoice("INV-2", vec![]);
        paid.status = InvoiceStatus::Paid;
        f.invoices.create(&actor(), paid).await?;
        let overdue = f.invoices.find_overdue(date(2024, 6, 1)).await?;
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].invoice_number, "INV-1");
        assert!(f.invoices.find_overdue(date(2024, 4, 10)).await?.is_empty());
        Ok(())
    }
}
