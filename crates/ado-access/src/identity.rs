//! Identity resolution.
//!
//! Resolves a raw subject token to exactly one directory identity:
//! 1. SID → lookup by identity descriptor
//! 2. Subject descriptor → lookup by subject descriptor
//! 3. Free text → search filters in [`determine_search_filters`] order, stopping at the
//!    first filter that returns anything

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{AccessError, AccessResult};
use crate::search::{determine_search_filters, SearchFilter};
use crate::subject::{classify, TokenShape};
use crate::types::DirectoryIdentity;

/// Identity type prefix of legacy identity descriptors.
pub const IDENTITY_DESCRIPTOR_PREFIX: &str = "Microsoft.TeamFoundation.Identity;";

/// One identity directory read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityQuery {
    /// Lookup by legacy identity descriptor.
    Descriptor(String),

    /// Lookup by graph subject descriptor.
    SubjectDescriptor(String),

    /// Search by filter.
    Search {
        filter: SearchFilter,
        value: String,
        include_restricted_visibility: bool,
    },
}

impl IdentityQuery {
    /// Membership expansion requested with every read.
    pub fn query_membership(&self) -> &'static str {
        "None"
    }

    fn describe(&self) -> String {
        match self {
            Self::Descriptor(d) => format!("descriptor {}", d),
            Self::SubjectDescriptor(d) => format!("subject descriptor {}", d),
            Self::Search { filter, .. } => filter.to_string(),
        }
    }
}

/// Identity directory collaborator.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn read_identities(&self, query: &IdentityQuery) -> AccessResult<Vec<DirectoryIdentity>>;
}

/// What to do when one search filter returns several identities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AmbiguityPolicy {
    /// Fail on the first ambiguous filter without trying later filters.
    #[default]
    FailFast,

    /// Keep trying later filters and return the first unique match; fail only if
    /// no filter produced a unique match but at least one was ambiguous.
    TryAllFilters,
}

/// Resolves subject tokens against an [`IdentityDirectory`].
pub struct IdentityResolver<'a, D: ?Sized> {
    directory: &'a D,
    policy: AmbiguityPolicy,
}

impl<'a, D: IdentityDirectory + ?Sized> IdentityResolver<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self {
            directory,
            policy: AmbiguityPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: AmbiguityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve a token to one identity.
    ///
    /// SID and descriptor tokens fail with `NotFound` when nothing matches. Free text that
    /// matches under no filter returns `Ok(None)`.
    pub async fn resolve(&self, token: &str) -> AccessResult<Option<DirectoryIdentity>> {
        let token = token.trim();

        match classify(token) {
            TokenShape::Empty => Err(AccessError::invalid_input("identity token is empty")),
            TokenShape::SecurityIdentifier => {
                let descriptor = if token.contains(';') {
                    token.to_string()
                } else {
                    format!("{}{}", IDENTITY_DESCRIPTOR_PREFIX, token)
                };
                debug!(sid = %token, "resolving identity by SID");
                self.resolve_exact(token, IdentityQuery::Descriptor(descriptor))
                    .await
                    .map(Some)
            }
            TokenShape::Descriptor => {
                debug!(descriptor = %token, "resolving identity by subject descriptor");
                self.resolve_exact(token, IdentityQuery::SubjectDescriptor(token.to_string()))
                    .await
                    .map(Some)
            }
            TokenShape::FreeText => self.search(token).await,
        }
    }

    async fn resolve_exact(
        &self,
        token: &str,
        query: IdentityQuery,
    ) -> AccessResult<DirectoryIdentity> {
        let mut identities = self.directory.read_identities(&query).await?;
        match identities.len() {
            0 => Err(AccessError::not_found(format!("identity '{}'", token))),
            1 => Ok(identities.remove(0)),
            count => Err(AccessError::AmbiguousIdentity {
                token: token.to_string(),
                filter: query.describe(),
                count,
            }),
        }
    }

    async fn search(&self, token: &str) -> AccessResult<Option<DirectoryIdentity>> {
        let mut first_ambiguity: Option<AccessError> = None;

        for filter in determine_search_filters(token) {
            let query = IdentityQuery::Search {
                filter,
                value: token.to_string(),
                include_restricted_visibility: true,
            };
            let mut identities = self.directory.read_identities(&query).await?;
            debug!(filter = %filter, matches = identities.len(), "identity search");

            match identities.len() {
                0 => continue,
                1 => {
                    let identity = identities.remove(0);
                    info!(filter = %filter, id = ?identity.id, "resolved identity");
                    return Ok(Some(identity));
                }
                count => {
                    let err = AccessError::AmbiguousIdentity {
                        token: token.to_string(),
                        filter: filter.to_string(),
                        count,
                    };
                    match self.policy {
                        AmbiguityPolicy::FailFast => return Err(err),
                        AmbiguityPolicy::TryAllFilters => {
                            first_ambiguity.get_or_insert(err);
                        }
                    }
                }
            }
        }

        match first_ambiguity {
            Some(err) => Err(err),
            None => {
                debug!(token = %token, "no identity matched any search filter");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{identity, FakeIdentityDirectory};

    #[tokio::test]
    async fn test_empty_token_is_invalid() {
        let directory = FakeIdentityDirectory::default();
        let result = IdentityResolver::new(&directory).resolve("   ").await;
        assert!(matches!(result, Err(AccessError::InvalidInput { .. })));
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sid_gets_prefix() {
        let directory = FakeIdentityDirectory::default().respond(
            IdentityQuery::Descriptor(
                "Microsoft.TeamFoundation.Identity;S-1-9-1551374245-1".to_string(),
            ),
            vec![identity("id-1", "vssgp.AAA", "Readers", true)],
        );

        let resolved = IdentityResolver::new(&directory)
            .resolve(" S-1-9-1551374245-1 ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id.as_deref(), Some("id-1"));
        assert_eq!(directory.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_prefixed_sid_kept_verbatim() {
        let token = "Microsoft.TeamFoundation.Identity;S-1-9-1551374245-1";
        let directory = FakeIdentityDirectory::default().respond(
            IdentityQuery::Descriptor(token.to_string()),
            vec![identity("id-1", "vssgp.AAA", "Readers", true)],
        );

        let resolved = IdentityResolver::new(&directory).resolve(token).await.unwrap();
        assert!(resolved.is_some());
        assert_eq!(
            directory.calls(),
            vec![IdentityQuery::Descriptor(token.to_string())]
        );
    }

    #[tokio::test]
    async fn test_sid_not_found_is_error() {
        let directory = FakeIdentityDirectory::default();
        let result = IdentityResolver::new(&directory).resolve("S-1-5-21-7").await;
        assert!(matches!(result, Err(AccessError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_descriptor_lookup() {
        let directory = FakeIdentityDirectory::default().respond(
            IdentityQuery::SubjectDescriptor("aad.MDAw".to_string()),
            vec![identity("id-2", "aad.MDAw", "Jane", false)],
        );

        let resolved = IdentityResolver::new(&directory)
            .resolve("aad.MDAw")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.display_name(), "Jane");
    }

    #[tokio::test]
    async fn test_descriptor_ambiguous() {
        let directory = FakeIdentityDirectory::default().respond(
            IdentityQuery::SubjectDescriptor("aad.MDAw".to_string()),
            vec![
                identity("id-2", "aad.MDAw", "Jane", false),
                identity("id-3", "aad.MDAw", "Jane", false),
            ],
        );

        let result = IdentityResolver::new(&directory).resolve("aad.MDAw").await;
        assert!(matches!(
            result,
            Err(AccessError::AmbiguousIdentity { count: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_free_text_stops_at_first_hit() {
        let directory = FakeIdentityDirectory::default()
            .respond(
                FakeIdentityDirectory::search(SearchFilter::General, "jane@contoso.com"),
                vec![identity("id-4", "aad.SkFORQ", "Jane", false)],
            )
            .respond(
                FakeIdentityDirectory::search(SearchFilter::MailAddress, "jane@contoso.com"),
                vec![identity("id-5", "aad.T1RIRVI", "Other", false)],
            );

        let resolved = IdentityResolver::new(&directory)
            .resolve("jane@contoso.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id.as_deref(), Some("id-4"));
        assert_eq!(directory.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_free_text_falls_through_empty_filters() {
        let directory = FakeIdentityDirectory::default().respond(
            FakeIdentityDirectory::search(SearchFilter::MailAddress, "jdoe"),
            vec![identity("id-6", "aad.SkRPRQ", "J Doe", false)],
        );

        let resolved = IdentityResolver::new(&directory)
            .resolve("jdoe")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id.as_deref(), Some("id-6"));

        let filters: Vec<SearchFilter> = directory
            .calls()
            .into_iter()
            .map(|q| match q {
                IdentityQuery::Search {
                    filter,
                    include_restricted_visibility,
                    ..
                } => {
                    assert!(include_restricted_visibility);
                    filter
                }
                other => panic!("unexpected query {other:?}"),
            })
            .collect();
        assert_eq!(
            filters,
            vec![
                SearchFilter::DirectoryAlias,
                SearchFilter::General,
                SearchFilter::MailAddress
            ]
        );
    }

    #[tokio::test]
    async fn test_free_text_exhausted_is_absence() {
        let directory = FakeIdentityDirectory::default();
        let resolved = IdentityResolver::new(&directory)
            .resolve("Nobody Here")
            .await
            .unwrap();
        assert!(resolved.is_none());
        assert_eq!(directory.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_ambiguous_fails_fast() {
        let directory = FakeIdentityDirectory::default()
            .respond(
                FakeIdentityDirectory::search(SearchFilter::DirectoryAlias, "jdoe"),
                vec![
                    identity("id-7", "aad.QQ", "John Doe", false),
                    identity("id-8", "aad.Qg", "Jane Doe", false),
                ],
            )
            .respond(
                FakeIdentityDirectory::search(SearchFilter::General, "jdoe"),
                vec![identity("id-7", "aad.QQ", "John Doe", false)],
            );

        let result = IdentityResolver::new(&directory).resolve("jdoe").await;
        match result {
            Err(AccessError::AmbiguousIdentity { filter, count, .. }) => {
                assert_eq!(filter, "DirectoryAlias");
                assert_eq!(count, 2);
            }
            other => panic!("expected AmbiguousIdentity, got {other:?}"),
        }
        assert_eq!(directory.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_try_all_filters_finds_later_unique() {
        let directory = FakeIdentityDirectory::default()
            .respond(
                FakeIdentityDirectory::search(SearchFilter::DirectoryAlias, "jdoe"),
                vec![
                    identity("id-7", "aad.QQ", "John Doe", false),
                    identity("id-8", "aad.Qg", "Jane Doe", false),
                ],
            )
            .respond(
                FakeIdentityDirectory::search(SearchFilter::General, "jdoe"),
                vec![identity("id-7", "aad.QQ", "John Doe", false)],
            );

        let resolved = IdentityResolver::new(&directory)
            .with_policy(AmbiguityPolicy::TryAllFilters)
            .resolve("jdoe")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id.as_deref(), Some("id-7"));
    }

    #[tokio::test]
    async fn test_try_all_filters_still_ambiguous() {
        let directory = FakeIdentityDirectory::default().respond(
            FakeIdentityDirectory::search(SearchFilter::MailAddress, "jdoe"),
            vec![
                identity("id-7", "aad.QQ", "John Doe", false),
                identity("id-8", "aad.Qg", "Jane Doe", false),
            ],
        );

        let result = IdentityResolver::new(&directory)
            .with_policy(AmbiguityPolicy::TryAllFilters)
            .resolve("jdoe")
            .await;
        assert!(matches!(
            result,
            Err(AccessError::AmbiguousIdentity { .. })
        ));
        assert_eq!(directory.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_directory_failure_propagates() {
        let directory = FakeIdentityDirectory::default().fail_with_dependency_error();
        let result = IdentityResolver::new(&directory).resolve("jdoe").await;
        assert!(matches!(
            result,
            Err(AccessError::DependencyFailure { .. })
        ));
        assert_eq!(directory.calls().len(), 1);
    }

    #[test]
    fn test_membership_is_none() {
        let query = IdentityQuery::SubjectDescriptor("aad.QQ".to_string());
        assert_eq!(query.query_membership(), "None");
    }
}
