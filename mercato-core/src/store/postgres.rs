use super::{OrderStore, ProductStore, StoreError};
use crate::entities::order_records::{
    GetOrderRecordBySessionId, InsertOrderRecord, OrderDraft, OrderRecord,
};
use crate::entities::products::{GetProductById, ProductSnapshot};
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;

#[async_trait]
impl OrderStore for DatabaseProcessor {
    async fn find_by_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<OrderRecord>, StoreError> {
        let record = self
            .process(GetOrderRecordBySessionId {
                session_id: session_id.to_owned(),
            })
            .await?;
        Ok(record)
    }

    async fn insert(&self, draft: OrderDraft) -> Result<OrderRecord, StoreError> {
        let session_id = draft.payment_session_id.clone();
        self.process(InsertOrderRecord { draft })
            .await
            .map_err(|e| classify_insert_error(e, session_id))
    }
}

#[async_trait]
impl ProductStore for DatabaseProcessor {
    async fn find_product(&self, product_id: &str) -> Result<Option<ProductSnapshot>, StoreError> {
        let product = self
            .process(GetProductById {
                product_id: product_id.to_owned(),
            })
            .await?;
        Ok(product)
    }
}

/// Map the `orders.payment_session_id` unique violation to its own variant.
fn classify_insert_error(err: sqlx::Error, session_id: String) -> StoreError {
    let is_unique = matches!(
        &err,
        sqlx::Error::Database(db_err) if db_err.is_unique_violation()
    );
    if is_unique {
        StoreError::UniqueViolation { session_id }
    } else {
        StoreError::Database(err)
    }
}
