#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum OrderError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no order size could be extracted from the request text")]
    NoSizeFound,
    #[error("unknown order: {0}")]
    UnknownOrder(String),
    #[error("continuation token is stale or unknown")]
    StaleOrUnknownToken,
    #[error("order has already been finalized")]
    OrderAlreadyFinalized,
    #[error("order is not approved for execution")]
    NotApproved,
    #[error("decision has already been recorded for this order")]
    DecisionAlreadySet,
}
