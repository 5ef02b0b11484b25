//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::descriptor::GraphDirectory;
use crate::error::{AccessError, AccessResult};
use crate::identity::{IdentityDirectory, IdentityQuery};
use crate::search::SearchFilter;
use crate::security::{AccessControlLists, SecurityNamespaces};
use crate::types::{
    AccessControlList, DirectoryIdentity, SecurityNamespace, Subject, SubjectKind,
};

pub(crate) fn identity(
    id: &str,
    subject_descriptor: &str,
    display_name: &str,
    is_container: bool,
) -> DirectoryIdentity {
    DirectoryIdentity {
        id: Some(id.to_string()),
        descriptor: None,
        subject_descriptor: Some(subject_descriptor.to_string()),
        provider_display_name: Some(display_name.to_string()),
        is_container,
        properties: Default::default(),
    }
}

pub(crate) fn subject(descriptor: &str, display_name: &str, kind: SubjectKind) -> Subject {
    Subject {
        descriptor: descriptor.to_string(),
        display_name: display_name.to_string(),
        subject_kind: kind,
        origin: Some("aad".to_string()),
        origin_id: None,
        principal_name: None,
        mail_address: None,
    }
}

/// Scripted identity directory; unscripted queries return no identities.
#[derive(Default)]
pub(crate) struct FakeIdentityDirectory {
    responses: Vec<(IdentityQuery, Vec<DirectoryIdentity>)>,
    fail: bool,
    calls: Mutex<Vec<IdentityQuery>>,
}

impl FakeIdentityDirectory {
    pub(crate) fn search(filter: SearchFilter, value: &str) -> IdentityQuery {
        IdentityQuery::Search {
            filter,
            value: value.to_string(),
            include_restricted_visibility: true,
        }
    }

    pub(crate) fn respond(mut self, query: IdentityQuery, result: Vec<DirectoryIdentity>) -> Self {
        self.responses.push((query, result));
        self
    }

    pub(crate) fn fail_with_dependency_error(mut self) -> Self {
        self.fail = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<IdentityQuery> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityDirectory for FakeIdentityDirectory {
    async fn read_identities(&self, query: &IdentityQuery) -> AccessResult<Vec<DirectoryIdentity>> {
        self.calls.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(AccessError::DependencyFailure {
                message: "HTTP 503: service unavailable".to_string(),
            });
        }
        Ok(self
            .responses
            .iter()
            .find(|(q, _)| q == query)
            .map(|(_, identities)| identities.clone())
            .unwrap_or_default())
    }
}

/// Graph directory whose lookups ignore descriptor case, like a service that
/// normalizes descriptors.
#[derive(Default)]
pub(crate) struct FakeGraphDirectory {
    subjects: Vec<Subject>,
    descriptors: HashMap<String, String>,
    lookup_not_found: bool,
    descriptor_calls: Mutex<Vec<String>>,
}

impl FakeGraphDirectory {
    pub(crate) fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    pub(crate) fn with_descriptor(mut self, storage_key: &str, descriptor: &str) -> Self {
        self.descriptors
            .insert(storage_key.to_string(), descriptor.to_string());
        self
    }

    pub(crate) fn lookup_returns_not_found(mut self) -> Self {
        self.lookup_not_found = true;
        self
    }

    pub(crate) fn descriptor_calls(&self) -> Vec<String> {
        self.descriptor_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphDirectory for FakeGraphDirectory {
    async fn lookup_subjects(
        &self,
        descriptors: &[String],
    ) -> AccessResult<HashMap<String, Subject>> {
        if self.lookup_not_found {
            return Err(AccessError::NotFound {
                what: "subject lookup".to_string(),
            });
        }
        Ok(self
            .subjects
            .iter()
            .filter(|s| descriptors.iter().any(|d| d.eq_ignore_ascii_case(&s.descriptor)))
            .map(|s| (s.descriptor.clone(), s.clone()))
            .collect())
    }

    async fn get_descriptor(&self, storage_key: &str) -> AccessResult<Option<String>> {
        self.descriptor_calls
            .lock()
            .unwrap()
            .push(storage_key.to_string());
        Ok(self.descriptors.get(storage_key).cloned())
    }
}

/// (namespace, token, descriptors, include_extended_info)
pub(crate) type AclCall = (String, String, Vec<String>, bool);

/// Every collaborator in one value, for service-level tests.
pub(crate) struct FakeOrganization {
    identities: FakeIdentityDirectory,
    graph: FakeGraphDirectory,
    namespaces: Vec<SecurityNamespace>,
    acls: Vec<AccessControlList>,
    acl_calls: Mutex<Vec<AclCall>>,
}

impl FakeOrganization {
    pub(crate) fn new(identities: FakeIdentityDirectory) -> Self {
        Self {
            identities,
            graph: FakeGraphDirectory::default(),
            namespaces: Vec::new(),
            acls: Vec::new(),
            acl_calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_namespace(mut self, namespace: SecurityNamespace) -> Self {
        self.namespaces.push(namespace);
        self
    }

    pub(crate) fn with_acl(mut self, acl: AccessControlList) -> Self {
        self.acls.push(acl);
        self
    }

    pub(crate) fn acl_calls(&self) -> Vec<AclCall> {
        self.acl_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityDirectory for FakeOrganization {
    async fn read_identities(&self, query: &IdentityQuery) -> AccessResult<Vec<DirectoryIdentity>> {
        self.identities.read_identities(query).await
    }
}

#[async_trait]
impl GraphDirectory for FakeOrganization {
    async fn lookup_subjects(
        &self,
        descriptors: &[String],
    ) -> AccessResult<HashMap<String, Subject>> {
        self.graph.lookup_subjects(descriptors).await
    }

    async fn get_descriptor(&self, storage_key: &str) -> AccessResult<Option<String>> {
        self.graph.get_descriptor(storage_key).await
    }
}

#[async_trait]
impl SecurityNamespaces for FakeOrganization {
    async fn list_namespaces(&self) -> AccessResult<Vec<SecurityNamespace>> {
        Ok(self.namespaces.clone())
    }

    async fn read_namespace(&self, namespace_id: &str) -> AccessResult<SecurityNamespace> {
        self.namespaces
            .iter()
            .find(|ns| ns.namespace_id.eq_ignore_ascii_case(namespace_id))
            .cloned()
            .ok_or_else(|| AccessError::NotFound {
                what: namespace_id.to_string(),
            })
    }
}

#[async_trait]
impl AccessControlLists for FakeOrganization {
    async fn query_access_control_lists(
        &self,
        namespace_id: &str,
        token: &str,
        descriptors: &[String],
        include_extended_info: bool,
    ) -> AccessResult<Vec<AccessControlList>> {
        self.acl_calls.lock().unwrap().push((
            namespace_id.to_string(),
            token.to_string(),
            descriptors.to_vec(),
            include_extended_info,
        ));
        Ok(self
            .acls
            .iter()
            .filter(|acl| acl.token == token)
            .cloned()
            .collect())
    }
}
