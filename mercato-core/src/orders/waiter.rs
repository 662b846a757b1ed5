//! Bounded polling for an order to appear.

use crate::config::CheckoutConfig;
use crate::entities::order_records::OrderRecord;
use crate::store::{OrderStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Shortest delay between two store lookups.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Blocks a caller until the order for a session becomes visible, or a
/// deadline passes.
#[derive(Clone)]
pub struct OrderWaiter {
    orders: Arc<dyn OrderStore>,
    poll_interval: Duration,
}

impl OrderWaiter {
    /// `poll_interval` is raised to [`MIN_POLL_INTERVAL`] if shorter.
    pub fn new(orders: Arc<dyn OrderStore>, poll_interval: Duration) -> Self {
        Self {
            orders,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    pub fn from_config(orders: Arc<dyn OrderStore>, config: &CheckoutConfig) -> Self {
        Self::new(orders, config.poll_interval)
    }

    /// Poll until the order for `session_id` exists or `timeout` elapses.
    ///
    /// `None` means "not yet", not "never". The call returns no later than
    /// `timeout` plus one store round-trip.
    #[tracing::instrument(skip(self))]
    pub async fn wait_for_order(
        &self,
        session_id: &str,
        timeout: Duration,
    ) -> Result<Option<OrderRecord>, StoreError> {
        let deadline = Instant::now() + timeout;
        let mut polls = 0u32;
        loop {
            polls += 1;
            if let Some(order) = self.orders.find_by_session_id(session_id).await? {
                debug!(polls, order_id = %order.order_id, "Order became visible");
                return Ok(Some(order));
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(polls, "Gave up waiting for order");
                return Ok(None);
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::order_records::OrderDraft;
    use crate::entities::{OrderStatus, PaymentStatus};
    use crate::store::MemoryOrderStore;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts lookups and never finds anything.
    #[derive(Default)]
    struct CountingStore {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl OrderStore for CountingStore {
        async fn find_by_session_id(&self, _: &str) -> Result<Option<OrderRecord>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
        async fn insert(&self, draft: OrderDraft) -> Result<OrderRecord, StoreError> {
            Err(StoreError::UniqueViolation {
                session_id: draft.payment_session_id,
            })
        }
    }

    fn draft(session_id: &str) -> OrderDraft {
        OrderDraft {
            payment_session_id: session_id.to_string(),
            user_id: None,
            line_items: vec![],
            total_amount: Decimal::ZERO,
            status: OrderStatus::Processing,
            payment_status: PaymentStatus::Paid,
            shipping_address: None,
            customer_info: None,
        }
    }

    #[tokio::test]
    async fn test_missing_session_times_out_on_schedule() {
        let waiter = OrderWaiter::new(Arc::new(MemoryOrderStore::new()), Duration::from_millis(100));

        let started = std::time::Instant::now();
        let found = waiter
            .wait_for_order("missing-session", Duration::from_millis(500))
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert!(found.is_none());
        assert!(elapsed >= Duration::from_millis(500), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(700), "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_order_inserted_later_is_found() {
        let orders = Arc::new(MemoryOrderStore::new());
        let waiter = OrderWaiter::new(orders.clone(), Duration::from_millis(20));

        let writer = {
            let orders = orders.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(80)).await;
                orders.insert(draft("cs_late")).await.unwrap()
            })
        };

        let found = waiter
            .wait_for_order("cs_late", Duration::from_secs(2))
            .await
            .unwrap()
            .unwrap();
        let inserted = writer.await.unwrap();
        assert_eq!(found.order_id, inserted.order_id);
    }

    #[tokio::test]
    async fn test_existing_order_returns_immediately() {
        let orders = Arc::new(MemoryOrderStore::new());
        orders.insert(draft("cs_1")).await.unwrap();
        let waiter = OrderWaiter::new(orders, Duration::from_secs(10));

        let started = std::time::Instant::now();
        let found = waiter
            .wait_for_order("cs_1", Duration::from_secs(10))
            .await
            .unwrap();
        assert!(found.is_some());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_zero_timeout_checks_once() {
        let waiter = OrderWaiter::new(Arc::new(MemoryOrderStore::new()), Duration::from_millis(100));
        let found = waiter
            .wait_for_order("cs_none", Duration::ZERO)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_poll_interval_is_raised_to_minimum() {
        let store = Arc::new(CountingStore::default());
        let waiter = OrderWaiter::new(store.clone(), Duration::ZERO);

        let found = waiter
            .wait_for_order("cs_none", Duration::from_millis(100))
            .await
            .unwrap();

        assert!(found.is_none());
        // One lookup at start, then one per 10ms step up to the deadline.
        assert_eq!(store.lookups.load(Ordering::SeqCst), 11);
    }
}
