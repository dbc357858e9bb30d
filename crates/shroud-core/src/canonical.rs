//! Deterministic CBOR for signed and hashed structures.
//!
//! Follows RFC 8949 Core Deterministic Encoding for the subset we emit:
//! - Map keys are small integers, sorted by encoded bytes
//! - Integers use the smallest valid encoding
//! - Definite lengths only
//! - No floats, no text
//!
//! Two structures are canonicalized: input-proof messages and event records.

use ciborium::value::Value;

use crate::event::{EventId, RoleEvent};
use crate::input::InputContext;
use crate::types::CiphertextHandle;

/// Domain prefix for input-proof signatures.
pub const PROOF_DOMAIN: &[u8] = b"shroud-input-proof-v0";

mod keys {
    pub const PROOF_HANDLE: u64 = 0;
    pub const PROOF_CONTRACT: u64 = 1;
    pub const PROOF_USER: u64 = 2;

    pub const EVENT_SEQ: u64 = 0;
    pub const EVENT_PREV: u64 = 1;
    pub const EVENT_KIND: u64 = 2;
    pub const EVENT_PRINCIPAL: u64 = 3;
}

/// The message an input-proof issuer signs: `PROOF_DOMAIN || cbor(handle, contract, user)`.
pub fn proof_message(handle: &CiphertextHandle, context: &InputContext) -> Vec<u8> {
    let value = Value::Map(vec![
        (int(keys::PROOF_HANDLE), Value::Bytes(handle.0.to_vec())),
        (int(keys::PROOF_CONTRACT), Value::Bytes(context.contract.0.to_vec())),
        (int(keys::PROOF_USER), Value::Bytes(context.user.0.to_vec())),
    ]);

    let mut buf = PROOF_DOMAIN.to_vec();
    encode_value_to(&mut buf, &value);
    buf
}

/// Canonical bytes of an event record body (everything except its id).
pub fn event_bytes(seq: u64, prev: Option<&EventId>, event: &RoleEvent) -> Vec<u8> {
    let prev = match prev {
        Some(id) => Value::Bytes(id.0.to_vec()),
        None => Value::Null,
    };

    let value = Value::Map(vec![
        (int(keys::EVENT_SEQ), int(seq)),
        (int(keys::EVENT_PREV), prev),
        (int(keys::EVENT_KIND), int(u64::from(event.kind_code()))),
        (
            int(keys::EVENT_PRINCIPAL),
            Value::Bytes(event.principal().0.to_vec()),
        ),
    ]);

    let mut buf = Vec::new();
    encode_value_to(&mut buf, &value);
    buf
}

fn int(n: u64) -> Value {
    Value::Integer(n.into())
}

fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            if n >= 0 {
                encode_uint(buf, 0, n as u64);
            } else {
                encode_uint(buf, 1, (-1 - n) as u64);
            }
        }
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Array(items) => {
            encode_uint(buf, 4, items.len() as u64);
            for item in items {
                encode_value_to(buf, item);
            }
        }
        Value::Map(entries) => encode_map(buf, entries),
        Value::Null => buf.push(0xf6),
        // Only the variants built above ever reach this encoder.
        _ => unreachable!("unsupported CBOR value in canonical encoding"),
    }
}

fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | n as u8);
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn encode_map(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut encoded: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key = Vec::new();
            encode_value_to(&mut key, k);
            (key, v)
        })
        .collect();
    encoded.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, encoded.len() as u64);
    for (key, value) in encoded {
        buf.extend_from_slice(&key);
        encode_value_to(buf, value);
    }
}
