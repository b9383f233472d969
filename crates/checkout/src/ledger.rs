//! Reservation ledger used to compensate inventory decrements.

use domain::ProductId;
use store::Catalog;

/// One successful reservation made during a placement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Ordered record of the inventory decrements made by one placement attempt.
///
/// A ledger lives for exactly one attempt. It is either consumed by
/// [`roll_back`](Self::roll_back) when the attempt fails before the order is
/// committed, or consumed by [`commit`](Self::commit) once it is.
#[derive(Debug, Default)]
pub struct ReservationLedger {
    entries: Vec<LedgerEntry>,
}

/// What a rollback managed to restore.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RollbackReport {
    pub restored: Vec<LedgerEntry>,
    /// Entries whose restore failed, with the failure message.
    pub failed: Vec<(LedgerEntry, String)>,
}

impl RollbackReport {
    /// Returns true if every entry was restored.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl ReservationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful reservation.
    pub fn record(&mut self, product_id: ProductId, quantity: u32) {
        self.entries.push(LedgerEntry {
            product_id,
            quantity,
        });
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discards the ledger after the order has been committed.
    pub fn commit(self) {
        tracing::debug!(entries = self.entries.len(), "reservation ledger committed");
    }

    /// Restores every recorded decrement, newest first.
    ///
    /// Best effort: a failed restore is logged and counted, and the remaining
    /// entries are still attempted. Failures never propagate to the caller.
    #[tracing::instrument(skip_all, fields(entries = self.entries.len()))]
    pub async fn roll_back<C>(self, catalog: &C) -> RollbackReport
    where
        C: Catalog + ?Sized,
    {
        let mut report = RollbackReport::default();

        for entry in self.entries.into_iter().rev() {
            let delta = i64::from(entry.quantity);
            let failure = match catalog.adjust_inventory(&entry.product_id, delta).await {
                Ok(Some(_)) => None,
                Ok(None) => Some("product no longer exists".to_string()),
                Err(e) => Some(e.to_string()),
            };

            match failure {
                None => report.restored.push(entry),
                Some(reason) => {
                    metrics::counter!("inventory_rollback_failures_total").increment(1);
                    tracing::warn!(
                        product_id = %entry.product_id,
                        quantity = entry.quantity,
                        %reason,
                        "failed to restore reserved inventory"
                    );
                    report.failed.push((entry, reason));
                }
            }
        }

        tracing::info!(
            restored = report.restored.len(),
            failed = report.failed.len(),
            "inventory rollback finished"
        );
        report
    }
}
