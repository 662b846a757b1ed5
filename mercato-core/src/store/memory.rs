//! In-process store implementations.
//!
//! They honour the same uniqueness contract as the Postgres store and are used
//! by tests and local runs without a database.

use super::{OrderStore, ProductStore, StoreError};
use crate::entities::order_records::{OrderDraft, OrderRecord};
use crate::entities::products::ProductSnapshot;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Orders keyed by payment session id.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<String, OrderRecord>>,
    insert_delay: Option<Duration>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before every insert, widening the window in which concurrent
    /// callers all miss the pre-check.
    pub fn with_insert_delay(mut self, delay: Duration) -> Self {
        self.insert_delay = Some(delay);
        self
    }

    /// Number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    /// Number of stored orders for one payment session (0 or 1).
    pub async fn count_for_session(&self, session_id: &str) -> usize {
        self.orders
            .read()
            .await
            .values()
            .filter(|o| o.payment_session_id == session_id)
            .count()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn find_by_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self.orders.read().await.get(session_id).cloned())
    }

    async fn insert(&self, draft: OrderDraft) -> Result<OrderRecord, StoreError> {
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }

        let mut orders = self.orders.write().await;
        if orders.contains_key(&draft.payment_session_id) {
            return Err(StoreError::UniqueViolation {
                session_id: draft.payment_session_id,
            });
        }

        let now = time::OffsetDateTime::now_utc();
        let now = time::PrimitiveDateTime::new(now.date(), now.time());
        let record = OrderRecord {
            order_id: Uuid::new_v4(),
            payment_session_id: draft.payment_session_id,
            user_id: draft.user_id,
            line_items: draft.line_items,
            total_amount: draft.total_amount,
            status: draft.status,
            payment_status: draft.payment_status,
            shipping_address: draft.shipping_address,
            customer_info: draft.customer_info,
            created_at: now,
            updated_at: now,
        };
        orders.insert(record.payment_session_id.clone(), record.clone());
        Ok(record)
    }
}

/// Catalog keyed by product id.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    products: RwLock<HashMap<String, ProductSnapshot>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = ProductSnapshot>) -> Self {
        Self {
            products: RwLock::new(
                products
                    .into_iter()
                    .map(|p| (p.product_id.clone(), p))
                    .collect(),
            ),
        }
    }

    /// Insert or replace a product, e.g. to simulate a price change.
    pub async fn upsert(&self, product: ProductSnapshot) {
        self.products
            .write()
            .await
            .insert(product.product_id.clone(), product);
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn find_product(&self, product_id: &str) -> Result<Option<ProductSnapshot>, StoreError> {
        Ok(self.products.read().await.get(product_id).cloned())
    }
}
