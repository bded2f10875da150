//! Intent extraction: pull a requested quantity out of free text

use crate::error::OrderError;

/// Scans the request text for the first positive integer and treats it as the
/// requested order size. A literal zero is a malformed order, not a missing
/// one, and is rejected before it can reach the gate.
pub fn extract_size(raw_text: &str) -> anyhow::Result<u32> {
    let mut saw_zero = false;

    for token in raw_text.split_whitespace() {
        let digits = token.trim_matches(|c: char| !c.is_ascii_digit());
        if digits.is_empty() {
            continue;
        }
        match digits.parse::<u32>() {
            Ok(0) => saw_zero = true,
            Ok(n) => return Ok(n),
            Err(_) => continue, // overflowing digit runs are not a size
        }
    }

    if saw_zero {
        return Err(OrderError::InvalidArgument("requested quantity must be positive".into()).into());
    }
    Err(OrderError::NoSizeFound.into())
}
