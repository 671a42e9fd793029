//! Allow-lists for origins and target hosts.

use std::collections::HashSet;

/// Wildcard entry that disables a restriction.
pub const WILDCARD: &str = "*";

/// An explicit enumeration of permitted values, or the "any" sentinel.
///
/// Membership is exact and case-sensitive. There is no partial or
/// pattern matching: `api.example.com` does not admit `v2.api.example.com`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowList {
    Any,
    Only(HashSet<String>),
}

impl AllowList {
    /// Build from configured entries. A `*` anywhere yields [`AllowList::Any`].
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = HashSet::new();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry == WILDCARD {
                return Self::Any;
            }
            if !entry.is_empty() {
                set.insert(entry.to_string());
            }
        }
        Self::Only(set)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    pub fn permits(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Only(set) => set.contains(value),
        }
    }
}
