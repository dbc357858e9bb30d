//! Authorization: the owner gate and the minimum-role check.

use tracing::{debug, warn};

use shroud_core::{Principal, Role};

use crate::error::{RegistryError, Result};

/// Refusal message for role mutations.
pub const OWNER_ONLY: &str = "Only owner can call this";

/// Refusal message for privileged operations.
pub const ADMIN_ONLY: &str = "Only admin can call this";

/// How `has_minimum_role` is decided.
///
/// The intended check compares the caller's encrypted role against the
/// threshold homomorphically and decrypts only the resulting bit. Until a
/// decryption path for that bit exists, the only variant is the
/// placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinimumRoleCheck {
    /// Always answers true. Not an access control.
    #[default]
    Placeholder,
}

/// Owner-based access policy.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    owner: Principal,
    minimum_role: MinimumRoleCheck,
}

impl AccessPolicy {
    pub fn new(owner: Principal) -> Self {
        Self {
            owner,
            minimum_role: MinimumRoleCheck::default(),
        }
    }

    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    pub fn is_owner(&self, caller: &Principal) -> bool {
        *caller == self.owner
    }

    /// Fail with `Unauthorized { message }` unless `caller` is the owner.
    pub fn require_owner(&self, caller: &Principal, message: &'static str) -> Result<()> {
        if self.is_owner(caller) {
            return Ok(());
        }
        warn!(caller = %caller, "rejected non-owner call");
        Err(RegistryError::Unauthorized {
            caller: *caller,
            message,
        })
    }

    pub fn minimum_role_check(&self) -> MinimumRoleCheck {
        self.minimum_role
    }

    /// Whether `caller` holds at least `threshold`.
    pub fn has_minimum_role(&self, caller: &Principal, threshold: Role) -> bool {
        match self.minimum_role {
            MinimumRoleCheck::Placeholder => {
                debug!(caller = %caller, threshold = %threshold, "minimum-role check is a placeholder");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(b: u8) -> Principal {
        Principal::from_bytes([b; 32])
    }

    #[test]
    fn test_owner_passes() {
        let policy = AccessPolicy::new(p(1));
        assert!(policy.require_owner(&p(1), OWNER_ONLY).is_ok());
    }

    #[test]
    fn test_non_owner_gets_message() {
        let policy = AccessPolicy::new(p(1));

        match policy.require_owner(&p(2), ADMIN_ONLY) {
            Err(RegistryError::Unauthorized { caller, message }) => {
                assert_eq!(caller, p(2));
                assert_eq!(message, "Only admin can call this");
            }
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_placeholder_always_true() {
        let policy = AccessPolicy::new(p(1));
        assert_eq!(policy.minimum_role_check(), MinimumRoleCheck::Placeholder);
        for role in Role::ALL {
            assert!(policy.has_minimum_role(&p(9), role));
        }
    }
}
