//! Owned snapshots of access control entries.
//!
//! ACL query results are shared by several readers (listing, showing, verifying a
//! removal). Each reader summarizes its own [`AceSnapshot`] rather than the service's
//! record.

use serde::Serialize;

use crate::types::{AccessControlEntry, AccessControlList, AceExtendedInfo, PermissionBits};

/// Deep copy of one access control entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AceSnapshot {
    pub descriptor: String,
    pub allow: PermissionBits,
    pub deny: PermissionBits,
    pub extended_info: Option<AceExtendedInfo>,
}

impl AceSnapshot {
    /// Copy an entry field by field, including its extended-info block.
    pub fn capture(entry: &AccessControlEntry) -> Self {
        Self {
            descriptor: entry.descriptor.clone(),
            allow: entry.allow,
            deny: entry.deny,
            extended_info: entry.extended_info.as_ref().map(|info| AceExtendedInfo {
                effective_allow: info.effective_allow,
                effective_deny: info.effective_deny,
                inherited_allow: info.inherited_allow,
                inherited_deny: info.inherited_deny,
            }),
        }
    }

    /// Entry for a subject with no ACE on the token.
    pub fn empty(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            allow: 0,
            deny: 0,
            extended_info: None,
        }
    }

    /// Effective allow; the explicit value when the service sent no extended info.
    pub fn effective_allow(&self) -> PermissionBits {
        self.extended_info
            .as_ref()
            .and_then(|info| info.effective_allow)
            .unwrap_or(self.allow)
    }

    pub fn effective_deny(&self) -> PermissionBits {
        self.extended_info
            .as_ref()
            .and_then(|info| info.effective_deny)
            .unwrap_or(self.deny)
    }

    /// Effective allow bits not set explicitly on this entry.
    pub fn inherited_allow(&self) -> PermissionBits {
        self.effective_allow() ^ self.allow
    }

    pub fn inherited_deny(&self) -> PermissionBits {
        self.effective_deny() ^ self.deny
    }
}

impl From<&AccessControlEntry> for AceSnapshot {
    fn from(entry: &AccessControlEntry) -> Self {
        Self::capture(entry)
    }
}

/// Find one descriptor's entry across lists: exact key first, then case-insensitive.
pub fn find_entry(acls: &[AccessControlList], descriptor: &str) -> Option<AceSnapshot> {
    let exact = acls
        .iter()
        .find_map(|acl| acl.aces_dictionary.get(descriptor));

    exact
        .or_else(|| {
            acls.iter().flat_map(|acl| acl.aces_dictionary.iter()).find_map(|(key, ace)| {
                (key.eq_ignore_ascii_case(descriptor)
                    || ace.descriptor.eq_ignore_ascii_case(descriptor))
                .then_some(ace)
            })
        })
        .map(AceSnapshot::capture)
}
