//! Azure DevOps REST client implementing the directory and security collaborators.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

use crate::auth::Credentials;
use crate::descriptor::GraphDirectory;
use crate::error::{AccessError, AccessResult};
use crate::identity::{IdentityDirectory, IdentityQuery};
use crate::security::{AccessControlLists, SecurityNamespaces};
use crate::types::{
    AccessControlList, AdoConfig, DirectoryIdentity, ListResponse, SecurityNamespace, Subject,
};

mod helpers;
mod http;

use helpers::{build_url, path_segment};
use http::HttpBackend;

/// User-Agent sent with every request.
pub const ADO_USER_AGENT: &str = concat!("ado-access/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SubjectLookupResponse {
    #[serde(default)]
    value: HashMap<String, Subject>,
}

#[derive(Debug, Deserialize)]
struct DescriptorResponse {
    #[serde(default)]
    value: Option<String>,
}

/// A 404 from a collection endpoint means the endpoint itself is missing, not that
/// nothing matched.
fn missing_endpoint(err: AccessError) -> AccessError {
    match err {
        AccessError::NotFound { what } => AccessError::DependencyFailure {
            message: format!("HTTP 404 for {}", what),
        },
        other => other,
    }
}

/// Azure DevOps REST client.
#[derive(Debug, Clone)]
pub struct AdoClient {
    http: HttpBackend,
    organization_url: String,
    vssps_url: String,
    api_version: String,
}

impl AdoClient {
    pub fn new(config: AdoConfig) -> AccessResult<Self> {
        let credentials = config
            .pat
            .as_ref()
            .map(Credentials::pat)
            .unwrap_or_else(Credentials::from_env);

        Self::with_credentials(config, credentials)
    }

    pub fn with_credentials(config: AdoConfig, credentials: Credentials) -> AccessResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(ADO_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| AccessError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            organization_url: config.organization_base()?,
            vssps_url: config.vssps_base()?,
            api_version: config.api_version.clone(),
            http: HttpBackend {
                client,
                credentials,
                max_retries: config.max_retries,
            },
        })
    }

    pub fn from_env() -> AccessResult<Self> {
        Self::new(AdoConfig::from_env())
    }

    pub fn organization_url(&self) -> &str {
        &self.organization_url
    }

    pub fn vssps_url(&self) -> &str {
        &self.vssps_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.http.credentials.is_authenticated()
    }

    fn identities_url(&self, query: &IdentityQuery) -> AccessResult<String> {
        let mut params: Vec<(&str, &str)> = vec![("api-version", self.api_version.as_str())];
        match query {
            IdentityQuery::Descriptor(descriptor) => {
                params.push(("descriptors", descriptor.as_str()))
            }
            IdentityQuery::SubjectDescriptor(descriptor) => {
                params.push(("subjectDescriptors", descriptor.as_str()))
            }
            IdentityQuery::Search {
                filter,
                value,
                include_restricted_visibility,
            } => {
                params.push(("searchFilter", filter.as_str()));
                params.push(("filterValue", value.as_str()));
                if *include_restricted_visibility {
                    params.push(("includeRestrictedVisibility", "true"));
                }
            }
        }
        params.push(("queryMembership", query.query_membership()));
        build_url(&self.vssps_url, "_apis/identities", &params)
    }
}

#[async_trait]
impl IdentityDirectory for AdoClient {
    async fn read_identities(&self, query: &IdentityQuery) -> AccessResult<Vec<DirectoryIdentity>> {
        let url = self.identities_url(query)?;
        debug!(url = %url, "reading identities");

        let response: ListResponse<DirectoryIdentity> =
            self.http.get_json(&url).await.map_err(missing_endpoint)?;
        Ok(response.value)
    }
}

#[async_trait]
impl GraphDirectory for AdoClient {
    async fn lookup_subjects(
        &self,
        descriptors: &[String],
    ) -> AccessResult<HashMap<String, Subject>> {
        let url = build_url(
            &self.vssps_url,
            "_apis/graph/subjectlookup",
            &[("api-version", self.api_version.as_str())],
        )?;
        debug!(url = %url, count = descriptors.len(), "looking up graph subjects");

        let body = serde_json::json!({
            "lookupKeys": descriptors
                .iter()
                .map(|d| serde_json::json!({ "descriptor": d }))
                .collect::<Vec<_>>(),
        });

        match self.http.post_json::<SubjectLookupResponse>(&url, &body).await {
            Ok(response) => Ok(response.value),
            Err(AccessError::NotFound { .. }) => Ok(HashMap::new()),
            Err(e) => Err(e),
        }
    }

    async fn get_descriptor(&self, storage_key: &str) -> AccessResult<Option<String>> {
        let url = build_url(
            &self.vssps_url,
            &format!("_apis/graph/descriptors/{}", path_segment(storage_key)),
            &[("api-version", self.api_version.as_str())],
        )?;
        debug!(url = %url, "fetching descriptor");

        match self.http.get_json::<DescriptorResponse>(&url).await {
            Ok(response) => Ok(response.value.filter(|d| !d.trim().is_empty())),
            Err(AccessError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SecurityNamespaces for AdoClient {
    async fn list_namespaces(&self) -> AccessResult<Vec<SecurityNamespace>> {
        let url = build_url(
            &self.organization_url,
            "_apis/securitynamespaces",
            &[("api-version", self.api_version.as_str())],
        )?;
        debug!(url = %url, "listing security namespaces");

        let response: ListResponse<SecurityNamespace> =
            self.http.get_json(&url).await.map_err(missing_endpoint)?;
        Ok(response.value)
    }

    async fn read_namespace(&self, namespace_id: &str) -> AccessResult<SecurityNamespace> {
        let url = build_url(
            &self.organization_url,
            &format!("_apis/securitynamespaces/{}", path_segment(namespace_id)),
            &[("api-version", self.api_version.as_str())],
        )?;
        debug!(url = %url, "reading security namespace");

        let response: ListResponse<SecurityNamespace> =
            self.http.get_json(&url).await.map_err(missing_endpoint)?;
        response
            .value
            .into_iter()
            .next()
            .ok_or_else(|| AccessError::not_found(format!("security namespace '{}'", namespace_id)))
    }
}

#[async_trait]
impl AccessControlLists for AdoClient {
    async fn query_access_control_lists(
        &self,
        namespace_id: &str,
        token: &str,
        descriptors: &[String],
        include_extended_info: bool,
    ) -> AccessResult<Vec<AccessControlList>> {
        let joined = descriptors.join(",");
        let mut params: Vec<(&str, &str)> = vec![("api-version", self.api_version.as_str())];
        if !token.is_empty() {
            params.push(("token", token));
        }
        if !joined.is_empty() {
            params.push(("descriptors", joined.as_str()));
        }
        if include_extended_info {
            params.push(("includeExtendedInfo", "true"));
        }

        let url = build_url(
            &self.organization_url,
            &format!("_apis/accesscontrollists/{}", path_segment(namespace_id)),
            &params,
        )?;
        debug!(url = %url, "querying access control lists");

        let response: ListResponse<AccessControlList> =
            self.http.get_json(&url).await.map_err(missing_endpoint)?;
        Ok(response.value)
    }
}
