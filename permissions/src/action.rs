//! Standard operations and their bit positions in a permission bitmask.

use std::fmt;
use std::str::FromStr;

/// A standard operation that has a dedicated bit in `standardOps`.
///
/// Anything not listed here can still be granted through `extendedOps`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Export,
    Import,
    Approve,
    Reject,
    Assign,
    Archive,
    Restore,
    Submit,
    Duplicate,
    Close,
    Lock,
    Unlock,
    Activate,
    Deactivate,
    Share,
    Audit,
}

impl Action {
    pub const ALL: [Self; 20] = [
        Self::Create,
        Self::Read,
        Self::Update,
        Self::Delete,
        Self::Export,
        Self::Import,
        Self::Approve,
        Self::Reject,
        Self::Assign,
        Self::Archive,
        Self::Restore,
        Self::Submit,
        Self::Duplicate,
        Self::Close,
        Self::Lock,
        Self::Unlock,
        Self::Activate,
        Self::Deactivate,
        Self::Share,
        Self::Audit,
    ];

    /// Bit assigned to this action; `Create` is bit 0.
    #[must_use]
    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Export => "export",
            Self::Import => "import",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Assign => "assign",
            Self::Archive => "archive",
            Self::Restore => "restore",
            Self::Submit => "submit",
            Self::Duplicate => "duplicate",
            Self::Close => "close",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Share => "share",
            Self::Audit => "audit",
        }
    }

    /// Look up a standard action by its lower-case name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Whether `mask` has this action's bit set.
    #[must_use]
    pub fn is_set_in(self, mask: u32) -> bool {
        mask & self.bit() != 0
    }

    /// Combine several actions into a mask.
    #[must_use]
    pub fn mask(actions: &[Self]) -> u32 {
        actions.iter().fold(0, |acc, a| acc | a.bit())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownAction(s.to_owned()))
    }
}

#[cfg(test)]
#[path = "action_test.rs"]
mod action_test;
