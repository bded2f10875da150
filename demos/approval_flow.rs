//! Walks a large order through suspension, approval, and batched execution
//! against an in-process mock backend and a throwaway sled database.
//!
//! Run with: cargo run --example approval_flow

use bulk_approval::backend::{ArtifactRef, BatchError, ImageBackend};
use bulk_approval::config::ApprovalConfig;
use bulk_approval::order::OrderStatus;
use bulk_approval::service::OrderService;
use std::sync::{Arc, Mutex};

struct DemoBackend {
    counter: Mutex<u32>,
}

impl ImageBackend for DemoBackend {
    fn generate(&self, prompt: &str, n: u32) -> Result<Vec<ArtifactRef>, BatchError> {
        let mut counter = self.counter.lock().unwrap();
        println!("backend: generating {n} images for {prompt:?}");

        let refs = (0..n)
            .map(|_| {
                *counter += 1;
                ArtifactRef(format!("https://images.example/demo/{counter:03}.png"))
            })
            .collect();
        Ok(refs)
    }
}

fn main() -> anyhow::Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let db = Arc::new(sled::open(temp_dir.path().join("demo.db"))?);
    let backend = Arc::new(DemoBackend {
        counter: Mutex::new(0),
    });

    let service = OrderService::new(db, backend, ApprovalConfig::default())?;

    // six images is above the default threshold of four, so this suspends
    let handle = service.submit("please generate 6 images of a red panda")?;
    println!("submit: {}", handle.notice);
    assert_eq!(handle.status, OrderStatus::PendingApproval);

    let token = handle.continuation_token.expect("pending order has a token");
    println!("token:  {token}");

    // arbitrarily later, the human channel delivers its decision
    let handle = service.resume(&handle.order_id, &token, true)?;
    println!("resume: {}", handle.notice);

    let result = handle.result.expect("approved order executed");
    for artifact in &result.artifacts {
        println!("  {}", artifact.0);
    }

    Ok(())
}
