//! Chain-specific types.

use alloy::primitives::Address;
use std::fmt;

use crate::blockchain::abi::ISummary;
use crate::error::UnisonError;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Role of an interaction contract relative to its summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Role {
    /// The owner of the interaction contract.
    Owner = 0,
    /// The provider of the interaction contract.
    Provider = 1,
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        role as u8
    }
}

impl TryFrom<u8> for Role {
    type Error = UnisonError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Role::Owner),
            1 => Ok(Role::Provider),
            other => Err(UnisonError::Remote(format!("Unknown interaction role {}", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Provider => write!(f, "provider"),
        }
    }
}

/// An interaction entry as stored by a summary contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    /// Address of the interaction contract.
    pub interaction: Address,
    pub enabled: bool,
    pub role: Role,
}

impl TryFrom<ISummary::InteractionInfo> for Interaction {
    type Error = UnisonError;

    fn try_from(info: ISummary::InteractionInfo) -> Result<Self, Self::Error> {
        Ok(Self {
            interaction: info.interaction,
            enabled: info.enable,
            role: Role::try_from(info.role)?,
        })
    }
}
