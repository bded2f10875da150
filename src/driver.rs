//! Batch execution driver: walks the capacity plan against the backend

use crate::backend::{ArtifactRef, ImageBackend};
use crate::error::OrderError;
use crate::order::{Order, OrderStatus};
use crate::policy;
use crate::store::SessionStore;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Succeeded { produced: u32 },
    Failed { reason: String },
}

/// Aggregated outcome of one order's execution. Artifacts from batches that
/// succeeded before a failure are kept, never discarded.
#[derive(Debug, Default)]
pub struct ExecutionResult {
    pub artifacts: Vec<ArtifactRef>,
    pub batches: Vec<BatchOutcome>,
    pub failure: Option<String>,
}

impl ExecutionResult {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct BatchDriver {
    store: SessionStore,
    backend: Arc<dyn ImageBackend>,
    cap: u32,
}

impl BatchDriver {
    pub fn new(store: SessionStore, backend: Arc<dyn ImageBackend>, cap: u32) -> Self {
        Self { store, backend, cap }
    }

    /// Execute an approved order: compute the batch plan, call the backend
    /// once per batch sequentially in plan order, and persist the terminal
    /// status. Batches for one order are never issued concurrently; the cap
    /// is a hard ceiling, not a suggestion. On the first failed batch no
    /// further batches are issued and the partial result is returned.
    pub fn execute(&self, order: &Order) -> anyhow::Result<ExecutionResult> {
        if order.status != OrderStatus::Approved {
            return Err(OrderError::NotApproved.into());
        }

        // the cap is read from configuration at plan time, never cached on
        // the order record
        let plan = policy::plan(order.requested_size, self.cap)?;
        info!(
            order_id = %order.order_id,
            size = order.requested_size,
            batches = plan.len(),
            "executing order"
        );

        let mut current = order.clone();
        current.status = OrderStatus::Executing;
        self.store.save(&current)?;

        let mut result = ExecutionResult::default();
        for batch in plan {
            match self.backend.generate(&current.prompt, batch) {
                Ok(artifacts) if artifacts.len() as u32 == batch => {
                    result.artifacts.extend(artifacts);
                    result.batches.push(BatchOutcome::Succeeded { produced: batch });
                }
                Ok(artifacts) => {
                    // all-or-nothing contract breach counts as a failed batch
                    let reason = format!(
                        "backend returned {} of {} artifacts",
                        artifacts.len(),
                        batch
                    );
                    return self.fail(current, result, reason);
                }
                Err(err) => return self.fail(current, result, err.to_string()),
            }
        }

        current.status = OrderStatus::Completed;
        self.store.save(&current)?;
        info!(order_id = %current.order_id, artifacts = result.artifacts.len(), "order completed");

        Ok(result)
    }

    fn fail(
        &self,
        mut order: Order,
        mut result: ExecutionResult,
        reason: String,
    ) -> anyhow::Result<ExecutionResult> {
        warn!(order_id = %order.order_id, %reason, "batch failed, stopping execution");

        result.batches.push(BatchOutcome::Failed {
            reason: reason.clone(),
        });
        result.failure = Some(reason);

        order.status = OrderStatus::Failed;
        self.store.save(&order)?;

        Ok(result)
    }
}
