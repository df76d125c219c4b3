//! Role identifiers and the fixed role registry.
//!
//! A [`RoleId`] is the name a plan or schedule uses for a participant. It is
//! opaque to scheduling and compared case-insensitively. A [`Role`] is the
//! closed set of behaviors an executor can dispatch on; the [`RoleRegistry`]
//! maps one to the other.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building role identifiers or the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    #[error("role id must be non-empty")]
    EmptyId,
    #[error("role registry must contain at least one role")]
    EmptyRegistry,
    #[error("duplicate role id '{0}' in registry")]
    DuplicateId(RoleId),
}

/// Case-insensitive participant name (stored lower-cased and trimmed).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleId(String);

impl RoleId {
    pub fn new(raw: &str) -> Result<Self, RoleError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(RoleError::EmptyId);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoleId {
    type Error = RoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<RoleId> for String {
    fn from(value: RoleId) -> Self {
        value.0
    }
}

/// Behavior category an executor dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Planner,
    Implementer,
    Verifier,
    Fixer,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Implementer => "implementer",
            Self::Verifier => "verifier",
            Self::Fixer => "fixer",
        }
    }

    /// The id this role is registered under by default.
    pub fn canonical_id(self) -> RoleId {
        RoleId(self.as_str().to_string())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registry row: the id a schedule refers to and the behavior behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    pub id: RoleId,
    pub role: Role,
}

/// Static default table. Canonical names first, then the names used by plans
/// written with the older agent vocabulary.
const DEFAULT_ROLES: [(&str, Role); 8] = [
    ("planner", Role::Planner),
    ("implementer", Role::Implementer),
    ("verifier", Role::Verifier),
    ("fixer", Role::Fixer),
    ("project_manager", Role::Planner),
    ("coder", Role::Implementer),
    ("tester", Role::Verifier),
    ("debugger", Role::Fixer),
];

/// Ordered, non-empty set of active roles with unique ids.
///
/// Definition order is significant: [`RoleRegistry::first`] is the fallback
/// role when a schedule names an id that is not registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRegistry {
    entries: Vec<RoleEntry>,
}

impl RoleRegistry {
    pub fn new(entries: Vec<RoleEntry>) -> Result<Self, RoleError> {
        if entries.is_empty() {
            return Err(RoleError::EmptyRegistry);
        }
        for (idx, entry) in entries.iter().enumerate() {
            if entries[..idx].iter().any(|prev| prev.id == entry.id) {
                return Err(RoleError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// The fallback role (first in definition order).
    pub fn first(&self) -> &RoleId {
        &self.entries[0].id
    }

    pub fn contains(&self, id: &RoleId) -> bool {
        self.entries.iter().any(|entry| &entry.id == id)
    }

    pub fn lookup(&self, id: &RoleId) -> Option<Role> {
        self.entries
            .iter()
            .find(|entry| &entry.id == id)
            .map(|entry| entry.role)
    }

    /// First registered id that dispatches to `role`.
    pub fn id_for(&self, role: Role) -> Option<&RoleId> {
        self.entries
            .iter()
            .find(|entry| entry.role == role)
            .map(|entry| &entry.id)
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self {
            entries: default_entries(),
        }
    }
}

/// The default registry table as owned entries.
pub fn default_entries() -> Vec<RoleEntry> {
    DEFAULT_ROLES
        .iter()
        .map(|(name, role)| RoleEntry {
            id: RoleId(name.to_string()),
            role: *role,
        })
        .collect()
}
