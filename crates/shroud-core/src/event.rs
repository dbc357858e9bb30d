//! Role notifications and the append-only event log.
//!
//! Every successful role mutation produces exactly one [`EventRecord`].
//! Records carry the affected principal and nothing else: there is no field
//! a role value, ciphertext handle or derived bit could ride along in.
//!
//! Records are hash-chained: each one names the id of its predecessor, and
//! its own id is `Blake3(canonical bytes)`. An auditor replaying the log can
//! detect a dropped, reordered or rewritten record with [`verify_chain`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::canonical::event_bytes;
use crate::error::{CoreError, Result};
use crate::types::Principal;

/// A role notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RoleEvent {
    RoleAssigned { principal: Principal },
    RoleRevoked { principal: Principal },
}

impl RoleEvent {
    /// The principal this event is about.
    pub fn principal(&self) -> &Principal {
        match self {
            RoleEvent::RoleAssigned { principal } | RoleEvent::RoleRevoked { principal } => {
                principal
            }
        }
    }

    /// Stable numeric code used in canonical encoding and storage.
    pub fn kind_code(&self) -> u8 {
        match self {
            RoleEvent::RoleAssigned { .. } => 1,
            RoleEvent::RoleRevoked { .. } => 2,
        }
    }

    /// Rebuild an event from its storage code.
    pub fn from_code(code: u8, principal: Principal) -> Option<Self> {
        match code {
            1 => Some(RoleEvent::RoleAssigned { principal }),
            2 => Some(RoleEvent::RoleRevoked { principal }),
            _ => None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, RoleEvent::RoleAssigned { .. })
    }

    pub fn is_revoked(&self) -> bool {
        matches!(self, RoleEvent::RoleRevoked { .. })
    }
}

/// Content id of an event record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub [u8; 32]);

impl EventId {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl TryFrom<&[u8]> for EventId {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> std::result::Result<Self, Self::Error> {
        Ok(Self(slice.try_into()?))
    }
}

/// One entry of the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 1.
    pub seq: u64,

    /// Id of the previous record (None for seq 1).
    pub prev: Option<EventId>,

    /// The notification.
    pub event: RoleEvent,
}

impl EventRecord {
    /// Build the record that follows `head` (or the first record if `head` is None).
    pub fn next(head: Option<&EventRecord>, event: RoleEvent) -> Self {
        match head {
            Some(h) => Self {
                seq: h.seq + 1,
                prev: Some(h.compute_id()),
                event,
            },
            None => Self {
                seq: 1,
                prev: None,
                event,
            },
        }
    }

    /// Compute the content id.
    pub fn compute_id(&self) -> EventId {
        let bytes = event_bytes(self.seq, self.prev.as_ref(), &self.event);
        EventId(*blake3::hash(&bytes).as_bytes())
    }

    pub fn principal(&self) -> &Principal {
        self.event.principal()
    }
}

/// Verify that `records` form a contiguous hash chain starting at seq 1.
pub fn verify_chain(records: &[EventRecord]) -> Result<()> {
    let mut prev: Option<EventId> = None;

    for (i, record) in records.iter().enumerate() {
        let expected_seq = i as u64 + 1;
        if record.seq != expected_seq {
            return Err(CoreError::SequenceGap {
                expected: expected_seq,
                got: record.seq,
            });
        }
        if record.prev != prev {
            return Err(CoreError::BrokenChain {
                seq: record.seq,
                expected: prev,
                got: record.prev,
            });
        }
        prev = Some(record.compute_id());
    }

    Ok(())
}

/// An in-memory append-only event log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, returning the record it became.
    pub fn append(&mut self, event: RoleEvent) -> &EventRecord {
        let record = EventRecord::next(self.records.last(), event);
        self.records.push(record);
        // Just pushed.
        &self.records[self.records.len() - 1]
    }

    /// The most recent record.
    pub fn head(&self) -> Option<&EventRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in log order.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `seq > after_seq`.
    pub fn since(&self, after_seq: u64) -> &[EventRecord] {
        let start = usize::try_from(after_seq)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    /// Records about `principal`, in log order.
    pub fn for_principal(&self, principal: &Principal) -> Vec<&EventRecord> {
        self.records
            .iter()
            .filter(|r| r.principal() == principal)
            .collect()
    }

    /// Verify this log's hash chain.
    pub fn verify(&self) -> Result<()> {
        verify_chain(&self.records)
    }
}
