//! The payment-to-order reconciliation flow.
//!
//! - [`OrderCreator`] turns a paid payment session into exactly one order.
//! - [`OrderWaiter`] lets the checkout-success path wait for the webhook's
//!   order instead of creating one itself.

mod creator;
mod session;
mod waiter;

pub use creator::{CreateOrderError, CreatedOrder, OrderCreator};
pub use session::{
    MAX_QUANTITY, RequestedItem, SessionDataError, SessionDescriptor, parse_line_items,
};
pub use waiter::OrderWaiter;
