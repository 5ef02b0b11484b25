//! Wire and domain types for the Azure DevOps identity, graph and security APIs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AccessError, AccessResult};

/// Permission bitmask as carried by the security APIs.
pub type PermissionBits = i32;

/// Kind of a graph subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubjectKind {
    User,
    Group,
}

impl From<String> for SubjectKind {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("group") {
            Self::Group
        } else {
            Self::User
        }
    }
}

impl From<SubjectKind> for String {
    fn from(kind: SubjectKind) -> Self {
        kind.to_string()
    }
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Group => write!(f, "Group"),
        }
    }
}

/// Canonical graph subject (user or group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Canonical descriptor, `<type>.<encoded-id>`.
    pub descriptor: String,

    #[serde(default)]
    pub display_name: String,

    pub subject_kind: SubjectKind,

    /// Origin directory (e.g. "aad", "vsts").
    #[serde(default)]
    pub origin: Option<String>,

    #[serde(default)]
    pub origin_id: Option<String>,

    #[serde(default)]
    pub principal_name: Option<String>,

    #[serde(default)]
    pub mail_address: Option<String>,
}

/// Identity record returned by the identity directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryIdentity {
    /// Storage key.
    #[serde(default)]
    pub id: Option<String>,

    /// Legacy identity descriptor (`Microsoft.TeamFoundation.Identity;S-...`).
    #[serde(default)]
    pub descriptor: Option<String>,

    #[serde(default)]
    pub subject_descriptor: Option<String>,

    #[serde(default)]
    pub provider_display_name: Option<String>,

    #[serde(default)]
    pub is_container: bool,

    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl DirectoryIdentity {
    /// Read a string property, unwrapping the `{"$type", "$value"}` envelope if present.
    pub fn property_str(&self, name: &str) -> Option<&str> {
        let value = self.properties.get(name)?;
        value
            .get("$value")
            .and_then(|v| v.as_str())
            .or_else(|| value.as_str())
    }

    /// Subject descriptor, treating empty strings as absent.
    pub fn subject_descriptor(&self) -> Option<&str> {
        self.subject_descriptor
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Storage key, treating empty strings as absent.
    pub fn storage_key(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.provider_display_name.as_deref().unwrap_or_default()
    }
}

/// One named action in a security namespace, bound to a single bit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    pub bit: PermissionBits,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub namespace_id: Option<String>,
}

impl ActionDefinition {
    pub fn new(bit: PermissionBits, name: impl Into<String>) -> Self {
        Self {
            bit,
            name: name.into(),
            display_name: String::new(),
            namespace_id: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Synthesized `Bit <n>` alias.
    pub fn bit_alias(&self) -> String {
        format!("Bit {}", self.bit)
    }

    /// Name, else display name, else the bit alias.
    pub fn label(&self) -> String {
        if !self.name.is_empty() {
            self.name.clone()
        } else if !self.display_name.is_empty() {
            self.display_name.clone()
        } else {
            self.bit_alias()
        }
    }
}

/// Security namespace description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityNamespace {
    pub namespace_id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}

/// Computed effective and inherited values for an ACE.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AceExtendedInfo {
    #[serde(default)]
    pub effective_allow: Option<PermissionBits>,

    #[serde(default)]
    pub effective_deny: Option<PermissionBits>,

    #[serde(default)]
    pub inherited_allow: Option<PermissionBits>,

    #[serde(default)]
    pub inherited_deny: Option<PermissionBits>,
}

/// Access control entry for one subject on one security token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControlEntry {
    pub descriptor: String,

    #[serde(default)]
    pub allow: PermissionBits,

    #[serde(default)]
    pub deny: PermissionBits,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_info: Option<AceExtendedInfo>,
}

/// Access control list for one security token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControlList {
    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub inherit_permissions: bool,

    #[serde(default)]
    pub aces_dictionary: BTreeMap<String, AccessControlEntry>,
}

/// `{"count": n, "value": [...]}` envelope used by list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdoConfig {
    /// Organization URL (e.g. `https://dev.azure.com/contoso`).
    #[serde(default)]
    pub organization_url: Option<String>,

    /// Identity/graph host override.
    #[serde(default)]
    pub vssps_url: Option<String>,

    /// Personal access token.
    #[serde(default)]
    pub pat: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// REST api-version query parameter.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_api_version() -> String {
    "7.1-preview.1".to_string()
}

impl Default for AdoConfig {
    fn default() -> Self {
        Self {
            organization_url: None,
            vssps_url: None,
            pat: None,
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            api_version: default_api_version(),
        }
    }
}

impl AdoConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `ADO_ORG_URL` | Organization URL |
    /// | `ADO_VSSPS_URL` | Identity/graph host override |
    /// | `ADO_PAT`, `AZURE_DEVOPS_EXT_PAT` | Personal access token |
    /// | `ADO_TIMEOUT` | Request timeout in seconds |
    /// | `ADO_MAX_RETRIES` | Max retries for transient failures |
    /// | `ADO_API_VERSION` | REST api-version |
    pub fn from_env() -> Self {
        Self {
            organization_url: non_empty_var("ADO_ORG_URL"),
            vssps_url: non_empty_var("ADO_VSSPS_URL"),
            pat: non_empty_var("ADO_PAT").or_else(|| non_empty_var("AZURE_DEVOPS_EXT_PAT")),
            timeout_secs: std::env::var("ADO_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            max_retries: std::env::var("ADO_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_retries),
            api_version: non_empty_var("ADO_API_VERSION").unwrap_or_else(default_api_version),
        }
    }

    /// Set the organization URL.
    pub fn with_organization_url(mut self, url: impl Into<String>) -> Self {
        self.organization_url = Some(url.into());
        self
    }

    /// Set the identity/graph host.
    pub fn with_vssps_url(mut self, url: impl Into<String>) -> Self {
        self.vssps_url = Some(url.into());
        self
    }

    /// Set the personal access token.
    pub fn with_pat(mut self, pat: impl Into<String>) -> Self {
        self.pat = Some(pat.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Organization base URL without trailing slash.
    pub fn organization_base(&self) -> AccessResult<String> {
        let raw = self
            .organization_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AccessError::Config {
                message: "organization URL is not set (use --org or ADO_ORG_URL)".to_string(),
            })?;
        let parsed = Url::parse(raw).map_err(|e| AccessError::Config {
            message: format!("invalid organization URL '{}': {}", raw, e),
        })?;
        Ok(parsed.as_str().trim_end_matches('/').to_string())
    }

    /// Identity/graph base URL.
    ///
    /// `https://dev.azure.com/<org>` maps to `https://vssps.dev.azure.com/<org>`; any other
    /// host (on-premises servers) serves identities from the organization URL itself.
    pub fn vssps_base(&self) -> AccessResult<String> {
        if let Some(explicit) = self.vssps_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(explicit.trim().trim_end_matches('/').to_string());
        }

        let org = self.organization_base()?;
        let mut parsed = Url::parse(&org).map_err(|e| AccessError::Config {
            message: format!("invalid organization URL '{}': {}", org, e),
        })?;
        if parsed.host_str() == Some("dev.azure.com") {
            parsed
                .set_host(Some("vssps.dev.azure.com"))
                .map_err(|e| AccessError::Config {
                    message: format!("cannot derive identity host: {}", e),
                })?;
        }
        Ok(parsed.as_str().trim_end_matches('/').to_string())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
