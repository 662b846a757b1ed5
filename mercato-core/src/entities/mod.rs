pub mod order_records;
pub mod products;

use mercato_sdk::objects::{OrderStatus as SdkOrderStatus, PaymentStatus as SdkPaymentStatus};

/// Order fulfilment status for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `mercato_sdk::objects::OrderStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "order_status")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl From<OrderStatus> for SdkOrderStatus {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Pending => SdkOrderStatus::Pending,
            OrderStatus::Processing => SdkOrderStatus::Processing,
            OrderStatus::Shipped => SdkOrderStatus::Shipped,
            OrderStatus::Delivered => SdkOrderStatus::Delivered,
            OrderStatus::Cancelled => SdkOrderStatus::Cancelled,
        }
    }
}

impl From<SdkOrderStatus> for OrderStatus {
    fn from(value: SdkOrderStatus) -> Self {
        match value {
            SdkOrderStatus::Pending => OrderStatus::Pending,
            SdkOrderStatus::Processing => OrderStatus::Processing,
            SdkOrderStatus::Shipped => OrderStatus::Shipped,
            SdkOrderStatus::Delivered => OrderStatus::Delivered,
            SdkOrderStatus::Cancelled => OrderStatus::Cancelled,
        }
    }
}

/// Payment status for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `mercato_sdk::objects::PaymentStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "payment_status")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl From<PaymentStatus> for SdkPaymentStatus {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Pending => SdkPaymentStatus::Pending,
            PaymentStatus::Paid => SdkPaymentStatus::Paid,
            PaymentStatus::Failed => SdkPaymentStatus::Failed,
            PaymentStatus::Refunded => SdkPaymentStatus::Refunded,
        }
    }
}

impl From<SdkPaymentStatus> for PaymentStatus {
    fn from(value: SdkPaymentStatus) -> Self {
        match value {
            SdkPaymentStatus::Pending => PaymentStatus::Pending,
            SdkPaymentStatus::Paid => PaymentStatus::Paid,
            SdkPaymentStatus::Failed => PaymentStatus::Failed,
            SdkPaymentStatus::Refunded => PaymentStatus::Refunded,
        }
    }
}
