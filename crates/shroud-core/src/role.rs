//! Role ordinals.
//!
//! A role only exists in plaintext on the client before encryption, and
//! transiently inside the compute layer. The registry itself never holds one.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

pub const ROLE_NONE: u8 = 0;
pub const ROLE_USER: u8 = 1;
pub const ROLE_MODERATOR: u8 = 2;
pub const ROLE_ADMIN: u8 = 3;

/// Authorization level, totally ordered by ordinal.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Role {
    #[default]
    None = ROLE_NONE,
    User = ROLE_USER,
    Moderator = ROLE_MODERATOR,
    Admin = ROLE_ADMIN,
}

impl Role {
    /// All roles in ascending order.
    pub const ALL: [Role; 4] = [Role::None, Role::User, Role::Moderator, Role::Admin];

    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Result<Self, CoreError> {
        match value {
            ROLE_NONE => Ok(Role::None),
            ROLE_USER => Ok(Role::User),
            ROLE_MODERATOR => Ok(Role::Moderator),
            ROLE_ADMIN => Ok(Role::Admin),
            other => Err(CoreError::UnknownRole(other)),
        }
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> u8 {
        role.to_u8()
    }
}

impl TryFrom<u8> for Role {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Role::from_u8(value)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::None => "NONE",
            Role::User => "USER",
            Role::Moderator => "MODERATOR",
            Role::Admin => "ADMIN",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_match_constants() {
        assert_eq!(Role::None.to_u8(), 0);
        assert_eq!(Role::User.to_u8(), 1);
        assert_eq!(Role::Moderator.to_u8(), 2);
        assert_eq!(Role::Admin.to_u8(), 3);
    }

    #[test]
    fn test_total_order() {
        assert!(Role::None < Role::User);
        assert!(Role::User < Role::Moderator);
        assert!(Role::Moderator < Role::Admin);
        assert_eq!(Role::ALL.iter().max(), Some(&Role::Admin));
    }

    #[test]
    fn test_unknown_ordinal_rejected() {
        assert!(matches!(Role::from_u8(4), Err(CoreError::UnknownRole(4))));
        assert_eq!(Role::try_from(2).unwrap(), Role::Moderator);
    }

    #[test]
    fn test_default_is_none() {
        assert_eq!(Role::default(), Role::None);
        assert_eq!(Role::default().to_u8(), ROLE_NONE);
    }
}
