//! End-to-end workflow scenarios for the approval-gated order core

use anyhow::Context;
use bulk_approval::backend::{ArtifactRef, BatchError, ImageBackend};
use bulk_approval::config::ApprovalConfig;
use bulk_approval::error::OrderError;
use bulk_approval::order::OrderStatus;
use bulk_approval::service::OrderService;
use sled::open;
use std::sync::{Arc, Mutex};

use tempfile::tempdir; // Use for test db cleanup.

/// Deterministic stand-in for the image backend. Records every call's batch
/// size and can be told to exhaust its retries on a specific call.
struct MockBackend {
    calls: Mutex<Vec<u32>>,
    fail_on_call: Option<usize>, // 1-based call index
}

impl MockBackend {
    fn new() -> Self {
        Self {
            calls: Mutex::new(vec![]),
            fail_on_call: None,
        }
    }

    fn failing_on(call: usize) -> Self {
        Self {
            calls: Mutex::new(vec![]),
            fail_on_call: Some(call),
        }
    }

    fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

impl ImageBackend for MockBackend {
    fn generate(&self, _prompt: &str, n: u32) -> Result<Vec<ArtifactRef>, BatchError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(n);

        if self.fail_on_call == Some(calls.len()) {
            return Err(BatchError::RateLimited);
        }

        // number artifacts across the whole order for deterministic naming
        let produced_before: u32 = calls[..calls.len() - 1].iter().sum();
        Ok((0..n)
            .map(|i| ArtifactRef(format!("img_{:03}", produced_before + i)))
            .collect())
    }
}

fn service_with(
    db: Arc<sled::Db>,
    backend: Arc<MockBackend>,
) -> anyhow::Result<OrderService> {
    OrderService::new(db, backend, ApprovalConfig::default())
}

// Scenario 1: size below the threshold auto-approves and executes in one
// backend call.
#[test]
fn small_order_executes_immediately() -> anyhow::Result<()> {
    // Sled uses file-based locking to prevent concurrent access, so each test
    // gets its own database on temp for simplified cleanup.
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("small_order.db"))?);
    let backend = Arc::new(MockBackend::new());

    let service = service_with(db, backend.clone())?;

    let handle = service
        .submit("please generate 3 images of a fox")
        .context("submit failed: ")?;

    assert_eq!(handle.status, OrderStatus::Completed);
    assert_eq!(backend.calls(), vec![3]);

    let result = handle.result.expect("completed order carries a result");
    assert_eq!(result.artifacts.len(), 3);
    assert!(result.is_complete());

    Ok(())
}

// Scenario 2: size above the threshold suspends; an approval resumes it and
// execution runs two batches (4 then 2).
#[test]
fn large_order_suspends_then_approves() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("approve_order.db"))?);
    let backend = Arc::new(MockBackend::new());

    let service = service_with(db, backend.clone())?;

    let handle = service.submit("generate 6 images of a red panda")?;
    assert_eq!(handle.status, OrderStatus::PendingApproval);
    assert!(handle.result.is_none());
    // nothing reaches the backend while the order is suspended
    assert!(backend.calls().is_empty());

    let token = handle.continuation_token.expect("pending handle carries the token");

    // the human channel delivers its decision arbitrarily later
    let handle = service
        .resume(&handle.order_id, &token, true)
        .context("resume failed: ")?;

    assert_eq!(handle.status, OrderStatus::Completed);
    assert_eq!(backend.calls(), vec![4, 2]);
    assert_eq!(handle.result.unwrap().artifacts.len(), 6);

    Ok(())
}

// Scenario 3: a rejected order never reaches the backend.
#[test]
fn rejected_order_generates_nothing() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("reject_order.db"))?);
    let backend = Arc::new(MockBackend::new());

    let service = service_with(db, backend.clone())?;

    let handle = service.submit("generate 10 images of a fox")?;
    assert_eq!(handle.status, OrderStatus::PendingApproval);

    let token = handle.continuation_token.unwrap();
    let handle = service.resume(&handle.order_id, &token, false)?;

    assert_eq!(handle.status, OrderStatus::Rejected);
    assert!(handle.result.is_none());
    assert!(handle.notice.contains("rejected"));
    assert!(backend.calls().is_empty());

    Ok(())
}

// Scenario 4: a failing second batch stops execution; artifacts from the
// first batch are preserved and disclosed, and the order is Failed.
#[test]
fn failed_batch_preserves_partial_results() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("partial_order.db"))?);
    let backend = Arc::new(MockBackend::failing_on(2));

    let service = service_with(db, backend.clone())?;

    let handle = service.submit("8 images of a lighthouse")?;
    let token = handle.continuation_token.unwrap();

    let handle = service.resume(&handle.order_id, &token, true)?;

    assert_eq!(handle.status, OrderStatus::Failed);
    // no third batch was issued after the failure
    assert_eq!(backend.calls(), vec![4, 4]);

    let result = handle.result.unwrap();
    assert_eq!(result.artifacts.len(), 4);
    assert!(!result.is_complete());
    assert!(result.failure.unwrap().contains("rate limited"));

    Ok(())
}

// A continuation token is single-use: once consumed, any further resume with
// it fails without touching the order.
#[test]
fn token_is_consumed_by_the_first_resume() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("single_use.db"))?);
    let backend = Arc::new(MockBackend::new());

    let service = service_with(db, backend.clone())?;

    let handle = service.submit("generate 6 images")?;
    let token = handle.continuation_token.unwrap();

    service.resume(&handle.order_id, &token, true)?;

    // second resume with the consumed token, regardless of decision value
    let err = service
        .resume(&handle.order_id, &token, false)
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<OrderError>(),
        Some(&OrderError::StaleOrUnknownToken)
    );

    // the executed order was not re-executed
    assert_eq!(backend.calls(), vec![4, 2]);

    Ok(())
}

#[test]
fn wrong_token_leaves_the_order_pending() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("wrong_token.db"))?);
    let backend = Arc::new(MockBackend::new());

    let service = service_with(db, backend.clone())?;

    let handle = service.submit("generate 6 images")?;

    let err = service
        .resume(&handle.order_id, "token_1notminted", true)
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<OrderError>(),
        Some(&OrderError::StaleOrUnknownToken)
    );

    // no mutation: the order is still suspended with its original token
    let order = service.order(&handle.order_id)?;
    assert_eq!(order.status, OrderStatus::PendingApproval);
    assert_eq!(order.continuation_token, handle.continuation_token);
    assert!(backend.calls().is_empty());

    Ok(())
}

// The suspension interval may span a full process restart: everything needed
// to resume lives in the session store, not in memory.
#[test]
fn resume_survives_a_process_restart() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("restart.db");

    let (order_id, token) = {
        let db = Arc::new(open(&db_path)?);
        let backend = Arc::new(MockBackend::new());
        let service = service_with(db, backend)?;

        let handle = service.submit("generate 6 images of a comet")?;
        assert_eq!(handle.status, OrderStatus::PendingApproval);

        (handle.order_id, handle.continuation_token.unwrap())
        // service and db dropped here, simulating process exit
    };

    // "restart": reopen the same database with a fresh service and backend
    let db = Arc::new(open(&db_path)?);
    let backend = Arc::new(MockBackend::new());
    let service = service_with(db, backend.clone())?;

    let handle = service.resume(&order_id, &token, true)?;

    assert_eq!(handle.status, OrderStatus::Completed);
    assert_eq!(backend.calls(), vec![4, 2]);
    assert_eq!(handle.result.unwrap().artifacts.len(), 6);

    Ok(())
}

// decide() is the id-only convenience wrapper; the token plumbing still
// applies underneath it.
#[test]
fn decide_by_order_id_resolves_the_pending_token() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("decide.db"))?);
    let backend = Arc::new(MockBackend::new());

    let service = service_with(db, backend.clone())?;

    let handle = service.submit("generate 5 images")?;
    let handle = service.decide(&handle.order_id, true)?;

    assert_eq!(handle.status, OrderStatus::Completed);
    assert_eq!(backend.calls(), vec![4, 1]);

    // deciding a finalized order is a protocol violation
    let err = service.decide(&handle.order_id, false).unwrap_err();
    assert_eq!(
        err.downcast_ref::<OrderError>(),
        Some(&OrderError::OrderAlreadyFinalized)
    );

    Ok(())
}
