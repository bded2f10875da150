//! The order record and its lifecycle fields
use crate::error::OrderError;
use crate::gate::ApprovalVerdict;
use crate::utils;
use chrono::{DateTime, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum OrderStatus {
    #[n(0)]
    New,
    #[n(1)]
    PendingApproval,
    #[n(2)]
    Approved,
    #[n(3)]
    Rejected,
    #[n(4)]
    Executing,
    #[n(5)]
    Completed,
    #[n(6)]
    Failed,
}

/// One user-initiated bulk request. Keyed in the session store by `order_id`;
/// the value is the CBOR encoding of this struct, read back bit-for-bit on
/// resume rather than relying on any in-memory continuation.
#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub struct Order {
    #[n(0)]
    pub order_id: String, // uuid7, bech32 encoded with hrp "order_"
    #[n(1)]
    pub prompt: String, // raw request text, handed to the backend per batch
    #[n(2)]
    pub requested_size: u32,
    #[n(3)]
    pub status: OrderStatus,
    #[n(4)]
    pub decision: Option<bool>, // set exactly once by the human channel
    #[n(5)]
    pub continuation_token: Option<String>, // single-use, minted on suspension
    #[n(6)]
    pub created_at: TimeStamp<Utc>,
    #[n(7)]
    pub decided_at: Option<TimeStamp<Utc>>,
}

impl Order {
    pub fn new(prompt: &str, requested_size: u32) -> anyhow::Result<Self> {
        if requested_size == 0 {
            return Err(OrderError::InvalidArgument(
                "requested quantity must be positive".into(),
            )
            .into());
        }

        Ok(Self {
            order_id: utils::new_uuid_to_bech32("order_")?,
            prompt: prompt.to_string(),
            requested_size,
            status: OrderStatus::New,
            decision: None,
            continuation_token: None,
            created_at: TimeStamp::new(),
            decided_at: None,
        })
    }

    /// Mint a single-use continuation token and park the order. The returned
    /// token is the only way a later decision can correlate with this record.
    pub fn suspend(&mut self) -> anyhow::Result<String> {
        let token = utils::new_uuid_to_bech32("token_")?;
        self.continuation_token = Some(token.clone());
        self.status = OrderStatus::PendingApproval;
        Ok(token)
    }

    /// Consume the pending token and fold the gate's re-evaluation into the
    /// record. Fails if a decision was already recorded; a decision is set
    /// exactly once, never overwritten.
    pub fn record_decision(
        &mut self,
        decision: bool,
        verdict: ApprovalVerdict,
    ) -> Result<(), OrderError> {
        if self.decision.is_some() {
            return Err(OrderError::DecisionAlreadySet);
        }

        self.continuation_token = None;
        self.decision = Some(decision);
        self.decided_at = Some(TimeStamp::new());
        self.status = match verdict {
            ApprovalVerdict::Approved => OrderStatus::Approved,
            ApprovalVerdict::Rejected => OrderStatus::Rejected,
            ApprovalVerdict::PendingApproval => return Err(OrderError::StaleOrUnknownToken),
        };

        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::PendingApproval
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Rejected | OrderStatus::Completed | OrderStatus::Failed
        )
    }

    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(minicbor::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(minicbor::decode(bytes)?)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}
