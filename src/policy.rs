//! Capacity policy for splitting an order into backend-sized batches

use crate::error::OrderError;

/// Greedy left-to-right chunking of `total` into batches of at most `cap`.
/// Every batch equals `cap` except possibly the last, which carries the
/// remainder. `plan(6, 4) == [4, 2]`, `plan(10, 4) == [4, 4, 2]`.
pub fn plan(total: u32, cap: u32) -> Result<Vec<u32>, OrderError> {
    if total == 0 {
        return Err(OrderError::InvalidArgument(
            "requested quantity must be positive".into(),
        ));
    }
    if cap == 0 {
        return Err(OrderError::InvalidArgument(
            "backend capacity must be positive".into(),
        ));
    }

    let mut batches = Vec::with_capacity(total.div_ceil(cap) as usize);
    let mut remaining = total;
    while remaining > 0 {
        let take = remaining.min(cap);
        batches.push(take);
        remaining -= take;
    }

    Ok(batches)
}
