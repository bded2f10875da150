//! Service layer API for the bulk-order workflow
use crate::backend::ImageBackend;
use crate::config::ApprovalConfig;
use crate::controller::Controller;
use crate::driver::{BatchDriver, ExecutionResult};
use crate::error::OrderError;
use crate::extract;
use crate::order::{Order, OrderStatus};
use crate::store::SessionStore;
use std::sync::Arc;
use tracing::info;

/// What the caller gets back from submit/decide. `result` is populated once
/// execution has run; a pending handle instead carries the continuation
/// token the human channel must present later.
#[derive(Debug)]
pub struct OrderHandle {
    pub order_id: String,
    pub status: OrderStatus,
    pub continuation_token: Option<String>,
    pub notice: String,
    pub result: Option<ExecutionResult>,
}

pub struct OrderService {
    store: SessionStore,
    controller: Controller,
    driver: BatchDriver,
    config: ApprovalConfig,
}

impl OrderService {
    pub fn new(
        db: Arc<sled::Db>,
        backend: Arc<dyn ImageBackend>,
        config: ApprovalConfig,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let store = SessionStore::new(db);
        let controller = Controller::new(store.clone(), config.threshold);
        let driver = BatchDriver::new(store.clone(), backend, config.cap);

        Ok(Self {
            store,
            controller,
            driver,
            config,
        })
    }

    /// Intake a raw request. Returns immediately in every case: either the
    /// order was small enough to auto-approve and has already executed, or
    /// it is parked as pending with a token for the decision channel.
    pub fn submit(&self, raw_text: &str) -> anyhow::Result<OrderHandle> {
        let size = extract::extract_size(raw_text)?;
        info!(size, "order submitted");

        let order = self.controller.start(raw_text, size)?;
        match order.status {
            OrderStatus::Approved => self.run(order),
            _ => Ok(pending_handle(&order, self.config.threshold)),
        }
    }

    /// Raw resumption entry point for the human decision channel. This is
    /// the only way a suspended order moves again.
    pub fn resume(&self, order_id: &str, token: &str, approve: bool) -> anyhow::Result<OrderHandle> {
        let order = self.controller.resume(order_id, token, approve)?;
        match order.status {
            OrderStatus::Approved => self.run(order),
            _ => Ok(rejected_handle(&order)),
        }
    }

    /// Convenience wrapper for callers that track orders by id only: loads
    /// the pending token and delegates to `resume`. Token checking still
    /// applies underneath.
    pub fn decide(&self, order_id: &str, approve: bool) -> anyhow::Result<OrderHandle> {
        let order = self.store.load(order_id)?;
        if order.is_terminal() {
            return Err(OrderError::OrderAlreadyFinalized.into());
        }
        let token = order
            .continuation_token
            .as_deref()
            .ok_or(OrderError::StaleOrUnknownToken)?;

        self.resume(order_id, token, approve)
    }

    /// Read back the persisted record, e.g. for status displays.
    pub fn order(&self, order_id: &str) -> anyhow::Result<Order> {
        self.store.load(order_id)
    }

    fn run(&self, order: Order) -> anyhow::Result<OrderHandle> {
        let result = self.driver.execute(&order)?;
        let status = self.store.load(&order.order_id)?.status;

        let notice = if result.is_complete() {
            format!(
                "Generated {} images for order {}.",
                result.artifacts.len(),
                order.order_id
            )
        } else {
            format!(
                "Generated {} of {} images before a batch failed: {}",
                result.artifacts.len(),
                order.requested_size,
                result.failure.as_deref().unwrap_or("unknown failure")
            )
        };

        Ok(OrderHandle {
            order_id: order.order_id,
            status,
            continuation_token: None,
            notice,
            result: Some(result),
        })
    }
}

fn pending_handle(order: &Order, threshold: u32) -> OrderHandle {
    OrderHandle {
        order_id: order.order_id.clone(),
        status: order.status,
        continuation_token: order.continuation_token.clone(),
        notice: format!(
            "Orders larger than {} images require approval. Generation of {} images is awaiting a decision.",
            threshold, order.requested_size
        ),
        result: None,
    }
}

fn rejected_handle(order: &Order) -> OrderHandle {
    OrderHandle {
        order_id: order.order_id.clone(),
        status: order.status,
        continuation_token: None,
        notice: format!(
            "Order for {} images was rejected. No images were generated.",
            order.requested_size
        ),
        result: None,
    }
}
