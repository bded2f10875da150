//! Approval decision gate

/// Outcome of a gate evaluation. Never persisted on its own, always folded
/// into the order's status by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalVerdict {
    Approved,
    Rejected,
    PendingApproval,
}

/// Pure decision function. Sizes at or below the threshold are approved
/// unconditionally; anything larger needs an explicit human decision, and
/// until one is bound the caller must suspend.
pub fn decide(size: u32, threshold: u32, decision: Option<bool>) -> ApprovalVerdict {
    if size <= threshold {
        return ApprovalVerdict::Approved;
    }

    match decision {
        None => ApprovalVerdict::PendingApproval,
        Some(true) => ApprovalVerdict::Approved,
        Some(false) => ApprovalVerdict::Rejected,
    }
}
