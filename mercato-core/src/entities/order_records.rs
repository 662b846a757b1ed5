use crate::entities::{OrderStatus, PaymentStatus};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use mercato_sdk::objects::{CustomerDetails, ShippingDetails};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// Largest total the `orders.total_amount NUMERIC(14, 2)` column holds,
/// 999_999_999_999.99.
pub const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// A persisted order. At most one exists per `payment_session_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub order_id: Uuid,
    pub payment_session_id: String,
    pub user_id: Option<String>,
    pub line_items: Vec<LineItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: Option<ShippingDetails>,
    pub customer_info: Option<CustomerDetails>,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

impl OrderRecord {
    /// Email snapshotted from the checkout session, if any.
    pub fn customer_email(&self) -> Option<&str> {
        self.customer_info
            .as_ref()
            .and_then(|c| c.email.as_deref())
            .filter(|email| !email.is_empty())
    }
}

/// One purchased product, with price, name and image frozen at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub name: String,
    pub image: Option<String>,
}

impl LineItem {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Everything needed to insert an order; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub payment_session_id: String,
    pub user_id: Option<String>,
    pub line_items: Vec<LineItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: Option<ShippingDetails>,
    pub customer_info: Option<CustomerDetails>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: Uuid,
    payment_session_id: String,
    user_id: Option<String>,
    line_items: Json<Vec<LineItem>>,
    total_amount: Decimal,
    status: OrderStatus,
    payment_status: PaymentStatus,
    shipping_address: Option<Json<ShippingDetails>>,
    customer_info: Option<Json<CustomerDetails>>,
    created_at: time::PrimitiveDateTime,
    updated_at: time::PrimitiveDateTime,
}

impl From<OrderRow> for OrderRecord {
    fn from(row: OrderRow) -> Self {
        Self {
            order_id: row.order_id,
            payment_session_id: row.payment_session_id,
            user_id: row.user_id,
            line_items: row.line_items.0,
            total_amount: row.total_amount,
            status: row.status,
            payment_status: row.payment_status,
            shipping_address: row.shipping_address.map(|j| j.0),
            customer_info: row.customer_info.map(|j| j.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ORDER_COLUMNS: &str = "order_id, payment_session_id, user_id, line_items, total_amount, \
    status, payment_status, shipping_address, customer_info, created_at, updated_at";

#[derive(Debug, Clone)]
/// Get the order created for a payment session.
pub struct GetOrderRecordBySessionId {
    pub session_id: String,
}

impl Processor<GetOrderRecordBySessionId> for DatabaseProcessor {
    type Output = Option<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderRecordBySessionId")]
    async fn process(
        &self,
        query: GetOrderRecordBySessionId,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_session_id = $1"
        ))
        .bind(query.session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(OrderRecord::from))
    }
}

#[derive(Debug, Clone)]
/// Insert a new order.
///
/// Fails with a unique violation on `payment_session_id` when an order for
/// the session already exists; it never overwrites.
pub struct InsertOrderRecord {
    pub draft: OrderDraft,
}

impl Processor<InsertOrderRecord> for DatabaseProcessor {
    type Output = OrderRecord;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertOrderRecord")]
    async fn process(&self, insert: InsertOrderRecord) -> Result<OrderRecord, sqlx::Error> {
        let draft = insert.draft;
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders
                (payment_session_id, user_id, line_items, total_amount, status,
                 payment_status, shipping_address, customer_info)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(draft.payment_session_id)
        .bind(draft.user_id)
        .bind(Json(draft.line_items))
        .bind(draft.total_amount)
        .bind(draft.status)
        .bind(draft.payment_status)
        .bind(draft.shipping_address.map(Json))
        .bind(draft.customer_info.map(Json))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}
