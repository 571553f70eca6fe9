//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `checkout` - Setup session policy, webhook dispatch, and error mapping

pub mod checkout;
