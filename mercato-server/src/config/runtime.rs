//! Runtime configuration re-exports.
//!
//! The actual config types are defined in `mercato_core::config`.
//! This module re-exports them for convenience.

pub use mercato_core::config::{
    CheckoutConfig, MailConfig, ServerConfig, SharedConfig, StripeConfig,
};
