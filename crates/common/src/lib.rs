//! Identifier types shared across the checkout crates.

mod types;

pub use types::{OrderId, UserId};
