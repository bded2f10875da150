//! Suspension/resume controller: the order lifecycle state machine

use crate::error::OrderError;
use crate::gate::{self, ApprovalVerdict};
use crate::order::{Order, OrderStatus};
use crate::store::SessionStore;
use tracing::info;

/// Owns a single order's transitions. On a pending verdict it persists the
/// record with a freshly minted continuation token and returns control to
/// the caller; no thread blocks across the suspension interval. Resumption
/// is a distinct later call correlated purely by that token, possibly after
/// a process restart.
pub struct Controller {
    store: SessionStore,
    threshold: u32,
}

impl Controller {
    pub fn new(store: SessionStore, threshold: u32) -> Self {
        Self { store, threshold }
    }

    /// Intake a new order and run it through the gate with no decision
    /// bound. Small orders come back `Approved`; large ones are suspended
    /// and persisted as `PendingApproval`.
    pub fn start(&self, prompt: &str, requested_size: u32) -> anyhow::Result<Order> {
        let mut order = Order::new(prompt, requested_size)?;

        match gate::decide(requested_size, self.threshold, None) {
            ApprovalVerdict::Approved => {
                order.status = OrderStatus::Approved;
                info!(order_id = %order.order_id, size = requested_size, "order auto-approved");
            }
            ApprovalVerdict::PendingApproval => {
                let token = order.suspend()?;
                info!(
                    order_id = %order.order_id,
                    size = requested_size,
                    %token,
                    "order suspended awaiting approval"
                );
            }
            ApprovalVerdict::Rejected => {
                order.status = OrderStatus::Rejected;
            }
        }

        self.store.save(&order)?;
        Ok(order)
    }

    /// Resume a suspended order with a human decision. The presented token
    /// must match the order's current pending token; a consumed, foreign or
    /// absent token fails with `StaleOrUnknownToken` and mutates nothing,
    /// whatever decision value rides along. The token is consumed via
    /// compare-and-swap, so of two racing resume calls exactly one wins.
    pub fn resume(&self, order_id: &str, token: &str, decision: bool) -> anyhow::Result<Order> {
        let current = self.store.load(order_id)?;

        if !current.is_pending() || current.continuation_token.as_deref() != Some(token) {
            return Err(OrderError::StaleOrUnknownToken.into());
        }

        let verdict = gate::decide(current.requested_size, self.threshold, Some(decision));

        let mut updated = current.clone();
        updated.record_decision(decision, verdict)?;

        if !self.store.swap(&current, &updated)? {
            // a concurrent resume consumed the token first
            return Err(OrderError::StaleOrUnknownToken.into());
        }

        info!(
            order_id = %updated.order_id,
            approved = decision,
            "order resumed with decision"
        );
        Ok(updated)
    }
}
