//! Storage ports used by the order flow.
//!
//! [`OrderStore`] is the only shared mutable resource in the reconciliation
//! path. Implementations must make `insert` atomic with respect to
//! `payment_session_id`: of any number of concurrent inserts for one session
//! exactly one succeeds and every other fails with
//! [`StoreError::UniqueViolation`]. Nothing above this layer takes a lock.

mod memory;
mod postgres;

pub use memory::{MemoryOrderStore, MemoryProductStore};

use crate::entities::order_records::{OrderDraft, OrderRecord};
use crate::entities::products::ProductSnapshot;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An order for this payment session already exists.
    #[error("an order for payment session {session_id} already exists")]
    UniqueViolation { session_id: String },

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

/// Persistent collection of orders, unique by payment session id.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_session_id(&self, session_id: &str)
    -> Result<Option<OrderRecord>, StoreError>;

    /// Insert a new order, failing with [`StoreError::UniqueViolation`] if
    /// one already exists for `draft.payment_session_id`.
    async fn insert(&self, draft: OrderDraft) -> Result<OrderRecord, StoreError>;
}

/// Read-only catalog lookup used to snapshot line items.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_product(&self, product_id: &str) -> Result<Option<ProductSnapshot>, StoreError>;
}
