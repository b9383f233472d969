//! Checkout coordinator for the order placement workflow.

use std::sync::Arc;
use std::time::Instant;

use domain::{CURRENCY_USD, NewOrder, Order, OrderLineSnapshot, OrderStatus, PaymentStatus};
use store::{Catalog, OrderStore, Reservation};

use crate::config::CheckoutConfig;
use crate::error::OrderError;
use crate::ledger::ReservationLedger;
use crate::request::{PlaceOrder, ValidatedOrder};
use crate::services::notification::Dispatch;
use crate::services::{
    ChargeOutcome, ChargeRequest, GatewayError, NotificationSender, PaymentGateway,
};

/// Orchestrates order placement.
///
/// The workflow reserves inventory line by line, prices the reserved lines,
/// charges the payment gateway and only then commits the order. Any failure
/// before the commit restores the reserved inventory from the attempt's
/// [`ReservationLedger`]. The confirmation is sent on a detached task.
pub struct CheckoutCoordinator<C, O, P, N>
where
    C: Catalog,
    O: OrderStore,
    P: PaymentGateway,
    N: NotificationSender + 'static,
{
    catalog: C,
    orders: O,
    payment: P,
    notifier: Arc<N>,
    config: CheckoutConfig,
}

impl<C, O, P, N> CheckoutCoordinator<C, O, P, N>
where
    C: Catalog,
    O: OrderStore,
    P: PaymentGateway,
    N: NotificationSender + 'static,
{
    pub fn new(catalog: C, orders: O, payment: P, notifier: N, config: CheckoutConfig) -> Self {
        Self {
            catalog,
            orders,
            payment,
            notifier: Arc::new(notifier),
            config,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn orders(&self) -> &O {
        &self.orders
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Places an order.
    ///
    /// Returns the committed order, or the first error encountered. When the
    /// error occurs before the order is committed, every inventory decrement
    /// made by this call has been restored (best effort) by the time it
    /// returns.
    #[tracing::instrument(
        skip(self, request),
        fields(user_id = %request.user_id, lines = request.lines.len())
    )]
    pub async fn place_order(&self, request: PlaceOrder) -> Result<Order, OrderError> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = Instant::now();

        let result = self.run(request).await;

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("checkout_duration_seconds").record(duration);
        match &result {
            Ok(order) => {
                metrics::counter!("checkout_completed_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    order_number = %order.order_number,
                    total = %order.total,
                    duration,
                    "order placed"
                );
            }
            Err(e) => {
                metrics::counter!("checkout_failed_total", "reason" => e.reason()).increment(1);
                tracing::warn!(error = %e, duration, "order placement failed");
            }
        }

        result
    }

    async fn run(&self, request: PlaceOrder) -> Result<Order, OrderError> {
        let request = request.validate()?;

        // 1. Reserve inventory for each line
        let mut ledger = ReservationLedger::new();
        let lines = match self.reserve_lines(&request, &mut ledger).await {
            Ok(lines) => lines,
            Err(e) => {
                ledger.roll_back(&self.catalog).await;
                return Err(e);
            }
        };

        // 2. Price the reserved lines
        let totals = match self.config.pricing.price(&lines) {
            Ok(totals) => totals,
            Err(e) => {
                ledger.roll_back(&self.catalog).await;
                return Err(OrderError::InvalidRequest(e.to_string()));
            }
        };
        tracing::info!(
            subtotal = %totals.subtotal,
            shipping = %totals.shipping,
            tax = %totals.tax,
            total = %totals.total,
            "order priced"
        );

        // 3. Charge the payment gateway
        let charge = ChargeRequest {
            amount: totals.total,
            currency: CURRENCY_USD.to_string(),
            payment_method: request.payment_method.clone(),
            details: request.payment_details.clone(),
        };
        let transaction_id = match self.charge(charge).await {
            Ok(transaction_id) => transaction_id,
            Err(e) => {
                ledger.roll_back(&self.catalog).await;
                return Err(e);
            }
        };

        // 4. Commit the order
        let ValidatedOrder {
            user_id,
            email,
            shipping_address,
            billing_address,
            payment_method,
            ..
        } = request;

        let new_order = NewOrder {
            user_id,
            status: OrderStatus::Pending,
            lines,
            totals,
            currency: CURRENCY_USD.to_string(),
            shipping_address,
            billing_address,
            payment_method,
            payment_status: PaymentStatus::Paid,
            transaction_id: Some(transaction_id.clone()),
        };

        let order = match self.orders.insert_order(new_order).await {
            Ok(order) => order,
            Err(e) => {
                // The charge is captured and stock stays reserved; both need
                // manual reconciliation against the transaction id.
                metrics::counter!("order_persistence_failures_total").increment(1);
                tracing::error!(
                    %transaction_id,
                    error = %e,
                    "payment captured but order could not be saved"
                );
                return Err(OrderError::Persistence(e));
            }
        };
        ledger.commit();

        // 5. Confirm without waiting
        Dispatch::Confirmation {
            order: order.clone(),
            email,
        }
        .spawn(Arc::clone(&self.notifier));

        Ok(order)
    }

    /// Reserves each line in request order, recording successes in `ledger`.
    async fn reserve_lines(
        &self,
        request: &ValidatedOrder,
        ledger: &mut ReservationLedger,
    ) -> Result<Vec<OrderLineSnapshot>, OrderError> {
        let mut snapshots = Vec::with_capacity(request.lines.len());

        for line in &request.lines {
            let reservation = self
                .catalog
                .reserve(&line.product_id, line.quantity)
                .await
                .map_err(OrderError::CatalogUnavailable)?;

            match reservation {
                Reservation::Reserved(product) => {
                    ledger.record(line.product_id.clone(), line.quantity);
                    let snapshot = OrderLineSnapshot::capture(&product, line)
                        .map_err(|e| OrderError::InvalidRequest(e.to_string()))?;
                    snapshots.push(snapshot);
                    tracing::debug!(
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        remaining = product.inventory,
                        "inventory reserved"
                    );
                }
                Reservation::Insufficient { available } => {
                    return Err(OrderError::InsufficientInventory {
                        product_id: line.product_id.clone(),
                        requested: line.quantity,
                        available,
                    });
                }
                Reservation::NotFound => {
                    return Err(OrderError::ProductNotFound(line.product_id.clone()));
                }
            }
        }

        Ok(snapshots)
    }

    /// Submits the charge, bounded by the configured timeout.
    async fn charge(&self, charge: ChargeRequest) -> Result<String, OrderError> {
        let timeout = self.config.gateway_timeout;

        let outcome = tokio::time::timeout(timeout, self.payment.charge(charge))
            .await
            .unwrap_or(Err(GatewayError::Timeout(timeout)));

        match outcome {
            Ok(ChargeOutcome::Approved { transaction_id }) => Ok(transaction_id),
            Ok(ChargeOutcome::Declined { reason }) => Err(OrderError::PaymentDeclined(reason)),
            Err(e) => Err(OrderError::PaymentGateway(e.to_string())),
        }
    }
}
