//! Identity resolution and permission inspection for Azure DevOps.
//!
//! This crate turns the loose identifiers people type (mail addresses, account
//! names, group names, security identifiers, graph descriptors) into directory
//! identities and graph subjects, and reads their access control entries:
//!
//! - Token classification and search-filter selection
//! - Identity resolution with ambiguity detection
//! - Graph subject resolution from identities
//! - Permission bitmask encoding and decoding per security namespace
//! - Allow/deny state classification, explicit versus inherited
//!
//! # Quick Start
//!
//! ```no_run
//! use ado_access::{AccessService, AdoClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = AdoClient::from_env()?;
//! let service = AccessService::new(&client);
//!
//! let namespace = service.namespace("Git Repositories").await?;
//! let report = service
//!     .show_permissions(&namespace, "repoV2", "jane@contoso.com", None)
//!     .await?;
//! for bit in &report.permissions {
//!     println!("{:<24} {}", bit.name, bit.state);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `ADO_ORG_URL` | Organization URL, e.g. `https://dev.azure.com/contoso` |
//! | `ADO_VSSPS_URL` | Identity host override (default: derived from the organization) |
//! | `ADO_PAT` / `AZURE_DEVOPS_EXT_PAT` | Personal access token |
//! | `ADO_BEARER_TOKEN` | OAuth bearer token, used when no PAT is set |
//! | `ADO_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `ADO_MAX_RETRIES` | Max retries for transient failures (default: 3) |
//! | `ADO_API_VERSION` | REST API version (default: `7.1-preview.1`) |

pub mod ace;
pub mod auth;
pub mod client;
pub mod descriptor;
pub mod error;
pub mod identity;
pub mod permissions;
pub mod search;
pub mod security;
pub mod service;
pub mod state;
pub mod subject;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types
pub use ace::{find_entry, AceSnapshot};
pub use auth::Credentials;
pub use client::{AdoClient, ADO_USER_AGENT};
pub use descriptor::{GraphDirectory, SubjectResolver};
pub use error::{AccessError, AccessResult};
pub use identity::{
    AmbiguityPolicy, IdentityDirectory, IdentityQuery, IdentityResolver,
    IDENTITY_DESCRIPTOR_PREFIX,
};
pub use permissions::{decode, encode, hex_literal, NO_PERMISSIONS};
pub use search::{determine_search_filters, SearchFilter};
pub use security::{find_namespace, AccessControlLists, SecurityNamespaces};
pub use service::{AccessService, AdoServices, PermissionReport};
pub use state::{classify_entry, BitState, PermissionState, PermissionValues};
pub use subject::TokenShape;
pub use types::{
    AccessControlEntry, AccessControlList, AceExtendedInfo, ActionDefinition, AdoConfig,
    DirectoryIdentity, PermissionBits, SecurityNamespace, Subject, SubjectKind,
};
