//! Request credentials for the Azure DevOps REST APIs.
//!
//! Supports:
//! - Personal access token, sent as HTTP Basic with an empty user name
//! - Bearer token (e.g. an Entra ID access token obtained elsewhere)
//!
//! Credentials are only attached to requests; no sign-in flow happens here.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Credentials attached to every request.
#[derive(Clone)]
pub enum Credentials {
    /// Personal access token.
    Pat(String),

    /// OAuth bearer token.
    Bearer(String),

    /// No authentication.
    None,
}

impl Credentials {
    pub fn pat(token: impl Into<String>) -> Self {
        Self::Pat(token.into())
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// Create from environment variables.
    ///
    /// Checks in order:
    /// 1. `ADO_PAT`
    /// 2. `AZURE_DEVOPS_EXT_PAT` (shared with the az devops extension)
    /// 3. `ADO_BEARER_TOKEN`
    /// 4. Falls back to no auth
    pub fn from_env() -> Self {
        for var in ["ADO_PAT", "AZURE_DEVOPS_EXT_PAT"] {
            if let Ok(token) = std::env::var(var) {
                if !token.is_empty() {
                    return Self::Pat(token);
                }
            }
        }

        if let Ok(token) = std::env::var("ADO_BEARER_TOKEN") {
            if !token.is_empty() {
                return Self::Bearer(token);
            }
        }

        Self::None
    }

    /// `Authorization` header value, if any.
    pub fn authorization_header(&self) -> Option<String> {
        match self {
            Self::Pat(token) => Some(format!("Basic {}", BASE64.encode(format!(":{}", token)))),
            Self::Bearer(token) => Some(format!("Bearer {}", token)),
            Self::None => None,
        }
    }

    /// Check if authentication is configured.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::from_env()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pat(_) => write!(f, "Credentials::Pat([REDACTED])"),
            Self::Bearer(_) => write!(f, "Credentials::Bearer([REDACTED])"),
            Self::None => write!(f, "Credentials::None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_pat_header() {
        let creds = Credentials::pat("abc");
        // base64(":abc")
        assert_eq!(creds.authorization_header().as_deref(), Some("Basic OmFiYw=="));
        assert!(creds.is_authenticated());
    }

    #[test]
    fn test_bearer_header() {
        let creds = Credentials::bearer("tok");
        assert_eq!(creds.authorization_header().as_deref(), Some("Bearer tok"));
    }

    #[test]
    fn test_debug_redacts() {
        let creds = Credentials::pat("super-secret");
        assert!(!format!("{:?}", creds).contains("super-secret"));
    }

    #[test]
    #[serial]
    fn test_from_env_order() {
        std::env::remove_var("ADO_PAT");
        std::env::remove_var("AZURE_DEVOPS_EXT_PAT");
        std::env::remove_var("ADO_BEARER_TOKEN");
        assert!(!Credentials::from_env().is_authenticated());

        std::env::set_var("ADO_BEARER_TOKEN", "b");
        assert!(matches!(Credentials::from_env(), Credentials::Bearer(_)));

        std::env::set_var("AZURE_DEVOPS_EXT_PAT", "p");
        assert!(matches!(Credentials::from_env(), Credentials::Pat(ref t) if t == "p"));

        std::env::remove_var("AZURE_DEVOPS_EXT_PAT");
        std::env::remove_var("ADO_BEARER_TOKEN");
    }
}
