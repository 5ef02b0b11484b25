//! End-to-end read flows over the collaborators.

use serde::Serialize;
use tracing::{debug, info};

use crate::ace::{find_entry, AceSnapshot};
use crate::descriptor::{GraphDirectory, SubjectResolver};
use crate::error::{AccessError, AccessResult};
use crate::identity::{AmbiguityPolicy, IdentityDirectory, IdentityResolver};
use crate::permissions::{allowed_mask, decode, encode, split_permission_tokens};
use crate::security::{find_namespace, is_namespace_id, AccessControlLists, SecurityNamespaces};
use crate::state::{classify_entry, BitState};
use crate::types::{DirectoryIdentity, PermissionBits, SecurityNamespace, Subject};

/// Every collaborator the service needs.
pub trait AdoServices:
    IdentityDirectory + GraphDirectory + SecurityNamespaces + AccessControlLists
{
}

impl<T> AdoServices for T where
    T: IdentityDirectory + GraphDirectory + SecurityNamespaces + AccessControlLists
{
}

/// Permissions of one subject on one security token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionReport {
    pub namespace_id: String,
    pub token: String,
    /// Identity descriptor the ACE is keyed by.
    pub descriptor: String,
    pub display_name: String,
    pub entry: AceSnapshot,
    pub allow: String,
    pub deny: String,
    pub effective_allow: String,
    pub effective_deny: String,
    pub permissions: Vec<BitState>,
}

/// Identity, subject and permission reads for one organization.
pub struct AccessService<'a, C: ?Sized> {
    client: &'a C,
    policy: AmbiguityPolicy,
}

impl<'a, C: AdoServices + ?Sized> AccessService<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            policy: AmbiguityPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: AmbiguityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve a token to one directory identity; `Ok(None)` when free text matched nothing.
    pub async fn resolve_identity(&self, token: &str) -> AccessResult<Option<DirectoryIdentity>> {
        IdentityResolver::new(self.client)
            .with_policy(self.policy)
            .resolve(token)
            .await
    }

    /// Resolve a token to a graph subject.
    pub async fn resolve_subject(&self, token: &str) -> AccessResult<Subject> {
        SubjectResolver::new(self.client, self.client)
            .with_policy(self.policy)
            .resolve_subject(token)
            .await
    }

    /// Find a namespace by id or name. Ids are read directly; names need the full list.
    pub async fn namespace(&self, key: &str) -> AccessResult<SecurityNamespace> {
        if is_namespace_id(key) {
            debug!(namespace = %key.trim(), "reading namespace by id");
            return self.client.read_namespace(key.trim()).await;
        }
        let namespaces = self.client.list_namespaces().await?;
        find_namespace(&namespaces, key).cloned()
    }

    /// Encode a comma-separated permission expression against a namespace.
    pub fn encode_permissions(
        &self,
        namespace: &SecurityNamespace,
        raw: &str,
    ) -> AccessResult<PermissionBits> {
        let tokens = split_permission_tokens(raw);
        encode(&namespace.actions, tokens.as_slice())
    }

    pub fn decode_permissions(&self, namespace: &SecurityNamespace, mask: PermissionBits) -> String {
        decode(&namespace.actions, mask)
    }

    /// Classify a subject's permissions on a security token.
    ///
    /// `requested` limits the report to the given permissions; `None` reports every
    /// action in the namespace.
    pub async fn show_permissions(
        &self,
        namespace: &SecurityNamespace,
        security_token: &str,
        subject_token: &str,
        requested: Option<&str>,
    ) -> AccessResult<PermissionReport> {
        let actions = &namespace.actions;
        let requested_bits = match requested {
            Some(raw) => {
                let bits = self.encode_permissions(namespace, raw)?;
                if bits == 0 {
                    return Err(AccessError::invalid_input("no permissions given"));
                }
                bits
            }
            None => allowed_mask(actions),
        };

        let identity = self.resolve_identity(subject_token).await?.ok_or_else(|| {
            AccessError::not_found(format!("no identity matched '{}'", subject_token.trim()))
        })?;
        let descriptor = identity
            .descriptor
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| {
                AccessError::not_found(format!(
                    "identity descriptor for '{}'",
                    identity.display_name()
                ))
            })?
            .to_string();

        debug!(
            namespace = %namespace.namespace_id,
            token = %security_token,
            descriptor = %descriptor,
            "querying access control entry"
        );
        let acls = self
            .client
            .query_access_control_lists(
                &namespace.namespace_id,
                security_token,
                std::slice::from_ref(&descriptor),
                true,
            )
            .await?;

        let entry = find_entry(&acls, &descriptor).unwrap_or_else(|| {
            info!(descriptor = %descriptor, "no access control entry for subject");
            AceSnapshot::empty(descriptor.clone())
        });

        Ok(PermissionReport {
            namespace_id: namespace.namespace_id.clone(),
            token: security_token.to_string(),
            display_name: identity.display_name().to_string(),
            allow: decode(actions, entry.allow),
            deny: decode(actions, entry.deny),
            effective_allow: decode(actions, entry.effective_allow()),
            effective_deny: decode(actions, entry.effective_deny()),
            permissions: classify_entry(actions, requested_bits, &entry),
            descriptor,
            entry,
        })
    }
}
