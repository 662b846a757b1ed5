//! Idempotent order creation.
//!
//! Both the webhook and the checkout-success handler may call
//! [`OrderCreator::create_order_safely`] for the same session, possibly at the
//! same instant and from different processes. The store's uniqueness
//! constraint on `payment_session_id` decides the winner; the loser re-reads
//! the winning row. There is no in-process lock.

use super::session::{SessionDataError, SessionDescriptor};
use crate::entities::order_records::{LineItem, MAX_ORDER_TOTAL, OrderDraft, OrderRecord};
use crate::entities::{OrderStatus, PaymentStatus};
use crate::notify::{Notifier, OrderConfirmation};
use crate::store::{OrderStore, ProductStore, StoreError};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Outcome of a successful call: the order, and whether this call inserted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOrder {
    pub created: bool,
    pub order: OrderRecord,
}

#[derive(Debug, Error)]
pub enum CreateOrderError {
    /// The session cannot describe an order. Nothing was written.
    #[error("invalid session data: {0}")]
    InvalidSessionData(#[from] SessionDataError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct OrderCreator {
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    notifier: Arc<dyn Notifier>,
}

impl OrderCreator {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            orders,
            products,
            notifier,
        }
    }

    /// Create the order for `session` exactly once.
    ///
    /// Returns `created: true` only for the call whose insert landed. Every
    /// other call, concurrent or later, gets `created: false` and the same
    /// order.
    #[tracing::instrument(skip_all, fields(session_id = %session.session_id))]
    pub async fn create_order_safely(
        &self,
        session: &SessionDescriptor,
    ) -> Result<CreatedOrder, CreateOrderError> {
        if let Some(order) = self.orders.find_by_session_id(&session.session_id).await? {
            debug!(order_id = %order.order_id, "Order already exists");
            return Ok(CreatedOrder {
                created: false,
                order,
            });
        }

        let requested = session.requested_items()?;

        let mut line_items = Vec::with_capacity(requested.len());
        let mut total_amount = Decimal::ZERO;
        for item in requested {
            let Some(product) = self.products.find_product(&item.product_id).await? else {
                warn!(product_id = %item.product_id, "Product not found, skipping line item");
                continue;
            };
            let line = LineItem {
                product_id: product.product_id,
                quantity: item.quantity,
                unit_price: product.price,
                name: product.name,
                image: product.image,
            };
            total_amount += line.subtotal();
            line_items.push(line);
        }

        if total_amount > MAX_ORDER_TOTAL {
            return Err(SessionDataError::TotalOutOfRange {
                total: total_amount,
            }
            .into());
        }

        let draft = OrderDraft {
            payment_session_id: session.session_id.clone(),
            user_id: session.user_id.clone(),
            line_items,
            total_amount,
            status: OrderStatus::Processing,
            payment_status: PaymentStatus::Paid,
            shipping_address: session.shipping.clone(),
            customer_info: session.customer.clone(),
        };

        match self.orders.insert(draft).await {
            Ok(order) => {
                info!(
                    order_id = %order.order_id,
                    total = %order.total_amount,
                    items = order.line_items.len(),
                    "Order created"
                );
                self.notify(&order).await;
                Ok(CreatedOrder {
                    created: true,
                    order,
                })
            }
            Err(e) if e.is_unique_violation() => {
                match self.orders.find_by_session_id(&session.session_id).await? {
                    Some(order) => {
                        info!(order_id = %order.order_id, "Lost creation race, using existing order");
                        Ok(CreatedOrder {
                            created: false,
                            order,
                        })
                    }
                    None => {
                        error!("Unique violation reported but no order found on re-query");
                        Err(e.into())
                    }
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Hand the confirmation off. Failures never reach the caller.
    async fn notify(&self, order: &OrderRecord) {
        let Some(confirmation) = OrderConfirmation::for_order(order) else {
            debug!(order_id = %order.order_id, "No customer email, skipping confirmation");
            return;
        };
        if let Err(e) = self.notifier.order_confirmed(confirmation).await {
            warn!(order_id = %order.order_id, error = %e, "Failed to queue order confirmation");
        }
    }
}
