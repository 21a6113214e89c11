//! Analysis modules.
//!
//! Group statistics live in the aggregator; condition handling builds on it.

pub mod aggregator;
pub mod conditions;

pub use aggregator::*;
pub use conditions::*;
