//! Proptest generators for property-based testing.

use proptest::prelude::*;

use shroud_core::{Keypair, Principal, Role, ROLE_ADMIN};

/// Generate a role.
pub fn role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::None),
        Just(Role::User),
        Just(Role::Moderator),
        Just(Role::Admin),
    ]
}

/// Generate a valid role ordinal.
pub fn role_ordinal() -> impl Strategy<Value = u8> {
    0u8..=ROLE_ADMIN
}

/// Generate a byte that is not a role ordinal.
pub fn invalid_ordinal() -> impl Strategy<Value = u8> {
    (ROLE_ADMIN + 1)..=u8::MAX
}

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate an arbitrary principal (not necessarily a valid public key).
pub fn principal() -> impl Strategy<Value = Principal> {
    any::<[u8; 32]>().prop_map(Principal::from_bytes)
}

/// One owner action against a small set of targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleOp {
    Assign { target: usize, role: Role },
    Revoke { target: usize },
}

impl RoleOp {
    pub fn target(&self) -> usize {
        match self {
            RoleOp::Assign { target, .. } | RoleOp::Revoke { target } => *target,
        }
    }

    /// The role the target holds after this op.
    pub fn resulting_role(&self) -> Role {
        match self {
            RoleOp::Assign { role, .. } => *role,
            RoleOp::Revoke { .. } => Role::None,
        }
    }
}

/// Generate one op over `targets` targets.
pub fn role_op(targets: usize) -> impl Strategy<Value = RoleOp> {
    prop_oneof![
        3 => (0..targets, role()).prop_map(|(target, role)| RoleOp::Assign { target, role }),
        1 => (0..targets).prop_map(|target| RoleOp::Revoke { target }),
    ]
}

/// Generate up to `max_len` ops over `targets` targets.
pub fn role_ops(targets: usize, max_len: usize) -> impl Strategy<Value = Vec<RoleOp>> {
    prop::collection::vec(role_op(targets), 1..=max_len)
}
