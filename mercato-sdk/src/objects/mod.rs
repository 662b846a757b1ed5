pub mod checkout;
pub mod event;
pub mod order;

pub use checkout::{
    Address, CheckoutSession, CustomerDetails, ITEMS_METADATA_KEY, SessionPaymentStatus,
    ShippingDetails, USER_ID_METADATA_KEY,
};
pub use event::{EventKind, ProviderEvent};
pub use order::{
    CheckoutConfirmation, ConfirmationStatus, LineItemResponse, OrderResponse, OrderStatus,
    PaymentStatus, WebhookAck,
};
