//! Order records and their status values.

mod record;
mod snapshot;
mod status;

pub use record::{CURRENCY_USD, NewOrder, Order, OrderNumber};
pub use snapshot::OrderLineSnapshot;
pub use status::{OrderStatus, PaymentStatus};
