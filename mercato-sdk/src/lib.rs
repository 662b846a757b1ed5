//! Shared wire types for Mercato.
//!
//! Everything in here is serialized across a process boundary: checkout
//! sessions and events received from the payment provider, and the order
//! payloads returned to the storefront.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![forbid(unsafe_code)]

pub mod objects;
pub mod signature;
