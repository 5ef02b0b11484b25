//! Subject descriptor resolution.
//!
//! Turns any subject token into a canonical graph [`Subject`]:
//! 1. Descriptor tokens are looked up in the graph directly
//! 2. Everything else resolves to a directory identity first, whose subject descriptor
//!    (or, failing that, the descriptor the graph assigns to its storage key) is then
//!    looked up in the graph
//! 3. Identities the graph does not know are synthesized from the directory record

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{AccessError, AccessResult};
use crate::identity::{AmbiguityPolicy, IdentityDirectory, IdentityResolver};
use crate::subject::{classify, TokenShape};
use crate::types::{DirectoryIdentity, Subject, SubjectKind};

/// Graph directory collaborator.
#[async_trait]
pub trait GraphDirectory: Send + Sync {
    /// Look up subjects by descriptor. Unknown descriptors are absent from the map.
    async fn lookup_subjects(&self, descriptors: &[String])
        -> AccessResult<HashMap<String, Subject>>;

    /// Descriptor assigned to an identity storage key, if any.
    async fn get_descriptor(&self, storage_key: &str) -> AccessResult<Option<String>>;
}

/// Resolves subject tokens to graph subjects.
pub struct SubjectResolver<'a, I: ?Sized, G: ?Sized> {
    identities: IdentityResolver<'a, I>,
    graph: &'a G,
}

impl<'a, I, G> SubjectResolver<'a, I, G>
where
    I: IdentityDirectory + ?Sized,
    G: GraphDirectory + ?Sized,
{
    pub fn new(directory: &'a I, graph: &'a G) -> Self {
        Self {
            identities: IdentityResolver::new(directory),
            graph,
        }
    }

    pub fn with_policy(mut self, policy: AmbiguityPolicy) -> Self {
        self.identities = self.identities.with_policy(policy);
        self
    }

    /// Resolve a token to a subject with a non-empty descriptor.
    pub async fn resolve_subject(&self, token: &str) -> AccessResult<Subject> {
        let token = token.trim();

        match classify(token) {
            TokenShape::Empty => Err(AccessError::invalid_input("subject token is empty")),
            TokenShape::Descriptor => self
                .lookup_graph_subject(token)
                .await?
                .ok_or_else(|| AccessError::not_found(format!("graph subject '{}'", token))),
            TokenShape::SecurityIdentifier | TokenShape::FreeText => {
                let identity = self.identities.resolve(token).await?.ok_or_else(|| {
                    AccessError::not_found(format!("no identity matched '{}'", token))
                })?;
                self.subject_for_identity(&identity).await
            }
        }
    }

    /// Graph subject for an already-resolved identity.
    pub async fn subject_for_identity(&self, identity: &DirectoryIdentity) -> AccessResult<Subject> {
        let descriptor = match identity.subject_descriptor() {
            Some(descriptor) => descriptor.to_string(),
            None => self.descriptor_from_storage_key(identity).await?,
        };

        if let Some(subject) = self.lookup_graph_subject(&descriptor).await? {
            return Ok(subject);
        }

        debug!(descriptor = %descriptor, "graph has no subject, synthesizing from identity");
        Ok(Subject {
            descriptor,
            display_name: identity.display_name().to_string(),
            subject_kind: if identity.is_container {
                SubjectKind::Group
            } else {
                SubjectKind::User
            },
            origin: None,
            origin_id: None,
            principal_name: None,
            mail_address: None,
        })
    }

    async fn descriptor_from_storage_key(&self, identity: &DirectoryIdentity) -> AccessResult<String> {
        let storage_key = identity.storage_key().ok_or_else(|| {
            AccessError::not_found(format!(
                "identity '{}' has neither a subject descriptor nor a storage key",
                identity.display_name()
            ))
        })?;

        debug!(storage_key = %storage_key, "fetching descriptor for storage key");
        self.graph
            .get_descriptor(storage_key)
            .await?
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| {
                AccessError::not_found(format!("descriptor for storage key '{}'", storage_key))
            })
    }

    /// Look up one graph subject. A missing subject is `Ok(None)`.
    ///
    /// Matches the exact descriptor key first, then falls back to a case-insensitive
    /// comparison in case the service normalized the descriptor's case.
    pub async fn lookup_graph_subject(&self, descriptor: &str) -> AccessResult<Option<Subject>> {
        let subjects = match self.graph.lookup_subjects(&[descriptor.to_string()]).await {
            Ok(subjects) => subjects,
            Err(AccessError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let found = subjects.get(descriptor).cloned().or_else(|| {
            let fallback = subjects
                .iter()
                .find(|(key, subject)| {
                    key.eq_ignore_ascii_case(descriptor)
                        || subject.descriptor.eq_ignore_ascii_case(descriptor)
                })
                .map(|(_, subject)| subject.clone());
            if fallback.is_some() {
                warn!(descriptor = %descriptor, "graph subject matched case-insensitively");
            }
            fallback
        });

        Ok(found.map(|mut subject| {
            if subject.descriptor.trim().is_empty() {
                subject.descriptor = descriptor.to_string();
            }
            subject
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityQuery;
    use crate::search::SearchFilter;
    use crate::testing::{identity, subject, FakeGraphDirectory, FakeIdentityDirectory};

    #[tokio::test]
    async fn test_descriptor_token_direct_lookup() {
        let directory = FakeIdentityDirectory::default();
        let graph = FakeGraphDirectory::default()
            .with_subject(subject("aad.SkFORQ", "Jane", SubjectKind::User));

        let resolved = SubjectResolver::new(&directory, &graph)
            .resolve_subject("aad.SkFORQ")
            .await
            .unwrap();
        assert_eq!(resolved.display_name, "Jane");
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_descriptor_token_not_in_graph() {
        let directory = FakeIdentityDirectory::default();
        let graph = FakeGraphDirectory::default();

        let result = SubjectResolver::new(&directory, &graph)
            .resolve_subject("aad.SkFORQ")
            .await;
        assert!(matches!(result, Err(AccessError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_graph_404_is_no_match() {
        let directory = FakeIdentityDirectory::default();
        let graph = FakeGraphDirectory::default().lookup_returns_not_found();

        let found = SubjectResolver::new(&directory, &graph)
            .lookup_graph_subject("aad.SkFORQ")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_case_insensitive_fallback() {
        let directory = FakeIdentityDirectory::default();
        let graph = FakeGraphDirectory::default()
            .with_subject(subject("aad.skforq", "Jane", SubjectKind::User));

        let found = SubjectResolver::new(&directory, &graph)
            .lookup_graph_subject("aad.SkFORQ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.descriptor, "aad.skforq");
    }

    #[tokio::test]
    async fn test_free_text_uses_identity_descriptor() {
        let directory = FakeIdentityDirectory::default().respond(
            FakeIdentityDirectory::search(SearchFilter::General, "jane@contoso.com"),
            vec![identity("id-1", "aad.SkFORQ", "Jane (dir)", false)],
        );
        let graph = FakeGraphDirectory::default()
            .with_subject(subject("aad.SkFORQ", "Jane Doe", SubjectKind::User));

        let resolved = SubjectResolver::new(&directory, &graph)
            .resolve_subject("jane@contoso.com")
            .await
            .unwrap();
        assert_eq!(resolved.display_name, "Jane Doe");
        assert!(graph.descriptor_calls().is_empty());
    }

    #[tokio::test]
    async fn test_storage_key_fallback() {
        let mut without_descriptor = identity("id-9", "", "Build Admins", true);
        without_descriptor.subject_descriptor = None;

        let directory = FakeIdentityDirectory::default().respond(
            IdentityQuery::Descriptor("Microsoft.TeamFoundation.Identity;S-1-9-1-2".to_string()),
            vec![without_descriptor],
        );
        let graph = FakeGraphDirectory::default()
            .with_descriptor("id-9", "vssgp.QkE")
            .with_subject(subject("vssgp.QkE", "[proj]\\Build Admins", SubjectKind::Group));

        let resolved = SubjectResolver::new(&directory, &graph)
            .resolve_subject("S-1-9-1-2")
            .await
            .unwrap();
        assert_eq!(resolved.descriptor, "vssgp.QkE");
        assert_eq!(resolved.subject_kind, SubjectKind::Group);
        assert_eq!(graph.descriptor_calls(), vec!["id-9".to_string()]);
    }

    #[tokio::test]
    async fn test_no_descriptor_no_storage_key() {
        let mut bare = identity("", "", "Ghost", false);
        bare.id = None;
        bare.subject_descriptor = None;

        let directory = FakeIdentityDirectory::default().respond(
            FakeIdentityDirectory::search(SearchFilter::DirectoryAlias, "ghost"),
            vec![bare],
        );
        let graph = FakeGraphDirectory::default();

        let result = SubjectResolver::new(&directory, &graph)
            .resolve_subject("ghost")
            .await;
        assert!(matches!(result, Err(AccessError::NotFound { .. })));
        assert!(graph.descriptor_calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_descriptor_from_service() {
        let mut without_descriptor = identity("id-9", "", "Ghost", false);
        without_descriptor.subject_descriptor = None;

        let directory = FakeIdentityDirectory::default().respond(
            FakeIdentityDirectory::search(SearchFilter::DirectoryAlias, "ghost"),
            vec![without_descriptor],
        );
        let graph = FakeGraphDirectory::default().with_descriptor("id-9", "  ");

        let result = SubjectResolver::new(&directory, &graph)
            .resolve_subject("ghost")
            .await;
        assert!(matches!(result, Err(AccessError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_synthesized_subject() {
        let directory = FakeIdentityDirectory::default().respond(
            FakeIdentityDirectory::search(SearchFilter::General, "Release Approvers"),
            vec![identity("id-3", "vssgp.UkE", "Release Approvers", true)],
        );
        let graph = FakeGraphDirectory::default();

        let resolved = SubjectResolver::new(&directory, &graph)
            .resolve_subject("Release Approvers")
            .await
            .unwrap();
        assert_eq!(resolved.descriptor, "vssgp.UkE");
        assert_eq!(resolved.display_name, "Release Approvers");
        assert_eq!(resolved.subject_kind, SubjectKind::Group);
        assert!(resolved.origin.is_none());
    }

    #[tokio::test]
    async fn test_unmatched_free_text_is_not_found() {
        let directory = FakeIdentityDirectory::default();
        let graph = FakeGraphDirectory::default();

        let result = SubjectResolver::new(&directory, &graph)
            .resolve_subject("nobody")
            .await;
        assert!(matches!(result, Err(AccessError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_empty_token() {
        let directory = FakeIdentityDirectory::default();
        let graph = FakeGraphDirectory::default();

        let result = SubjectResolver::new(&directory, &graph)
            .resolve_subject("")
            .await;
        assert!(matches!(result, Err(AccessError::InvalidInput { .. })));
    }
}
