//! Security namespace and access control list collaborators.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AccessError, AccessResult};
use crate::types::{AccessControlList, SecurityNamespace};

/// Security namespace catalogue collaborator.
#[async_trait]
pub trait SecurityNamespaces: Send + Sync {
    /// All namespaces in the organization.
    async fn list_namespaces(&self) -> AccessResult<Vec<SecurityNamespace>>;

    /// One namespace by id.
    async fn read_namespace(&self, namespace_id: &str) -> AccessResult<SecurityNamespace>;
}

/// Read side of the access control list service.
#[async_trait]
pub trait AccessControlLists: Send + Sync {
    async fn query_access_control_lists(
        &self,
        namespace_id: &str,
        token: &str,
        descriptors: &[String],
        include_extended_info: bool,
    ) -> AccessResult<Vec<AccessControlList>>;
}

lazy_static! {
    static ref NAMESPACE_ID: Regex = Regex::new(
        r"^[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}$"
    )
    .unwrap();
}

/// True when `key` is shaped like a namespace id (a hyphenated GUID).
pub fn is_namespace_id(key: &str) -> bool {
    NAMESPACE_ID.is_match(key.trim())
}

/// Pick a namespace by id or by name (case-insensitive).
pub fn find_namespace<'a>(
    namespaces: &'a [SecurityNamespace],
    key: &str,
) -> AccessResult<&'a SecurityNamespace> {
    let key = key.trim();
    if key.is_empty() {
        return Err(AccessError::invalid_input("namespace is empty"));
    }

    if let Some(ns) = namespaces
        .iter()
        .find(|ns| ns.namespace_id.eq_ignore_ascii_case(key))
    {
        return Ok(ns);
    }

    let by_name: Vec<&SecurityNamespace> = namespaces
        .iter()
        .filter(|ns| {
            ns.name
                .as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case(key))
                || ns
                    .display_name
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(key))
        })
        .collect();

    match by_name.as_slice() {
        [] => Err(AccessError::not_found(format!("security namespace '{}'", key))),
        [ns] => Ok(*ns),
        many => Err(AccessError::InvalidInput {
            reason: format!(
                "namespace name '{}' matches {} namespaces; use the namespace id",
                key,
                many.len()
            ),
        }),
    }
}
