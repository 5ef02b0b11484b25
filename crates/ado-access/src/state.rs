//! Per-bit permission state: allowed or denied, explicit or inherited.

use serde::Serialize;

use crate::ace::AceSnapshot;
use crate::types::{ActionDefinition, PermissionBits};

/// State of one permission bit for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PermissionState {
    Allow,
    #[serde(rename = "Allow (inherited)")]
    AllowInherited,
    Deny,
    #[serde(rename = "Deny (inherited)")]
    DenyInherited,
    #[serde(rename = "Not set")]
    NotSet,
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Allow => "Allow",
            Self::AllowInherited => "Allow (inherited)",
            Self::Deny => "Deny",
            Self::DenyInherited => "Deny (inherited)",
            Self::NotSet => "Not set",
        })
    }
}

/// Explicit and effective masks of one entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionValues {
    pub allow: PermissionBits,
    pub deny: PermissionBits,
    pub effective_allow: PermissionBits,
    pub effective_deny: PermissionBits,
}

impl PermissionValues {
    pub fn inherited_allow(&self) -> PermissionBits {
        self.effective_allow ^ self.allow
    }

    pub fn inherited_deny(&self) -> PermissionBits {
        self.effective_deny ^ self.deny
    }

    /// State of a single bit. Deny takes precedence over allow.
    pub fn state_of(&self, bit: PermissionBits) -> PermissionState {
        if self.effective_deny & bit != 0 {
            if self.inherited_deny() & bit != 0 {
                PermissionState::DenyInherited
            } else {
                PermissionState::Deny
            }
        } else if self.effective_allow & bit != 0 {
            if self.inherited_allow() & bit != 0 {
                PermissionState::AllowInherited
            } else {
                PermissionState::Allow
            }
        } else {
            PermissionState::NotSet
        }
    }
}

impl From<&AceSnapshot> for PermissionValues {
    fn from(ace: &AceSnapshot) -> Self {
        Self {
            allow: ace.allow,
            deny: ace.deny,
            effective_allow: ace.effective_allow(),
            effective_deny: ace.effective_deny(),
        }
    }
}

/// One classified action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitState {
    pub bit: PermissionBits,
    pub name: String,
    pub state: PermissionState,
}

/// Classify every catalogue action whose bit is in `requested`, in catalogue order.
pub fn classify(
    actions: &[ActionDefinition],
    requested: PermissionBits,
    values: &PermissionValues,
) -> Vec<BitState> {
    actions
        .iter()
        .filter(|action| action.bit != 0 && requested & action.bit == action.bit)
        .map(|action| BitState {
            bit: action.bit,
            name: action.label(),
            state: values.state_of(action.bit),
        })
        .collect()
}

/// [`classify`] against a snapshot's explicit and effective masks.
pub fn classify_entry(
    actions: &[ActionDefinition],
    requested: PermissionBits,
    ace: &AceSnapshot,
) -> Vec<BitState> {
    classify(actions, requested, &PermissionValues::from(ace))
}
