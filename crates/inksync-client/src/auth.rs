//! API versions and the integration credential.
//!
//! The two supported service API versions differ only in the auth header
//! they expect and in the field naming of the base-URI discovery payload;
//! everything downstream of discovery is identical.

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote API version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// Legacy API: `Access-Token` header, snake_case discovery fields.
    V5,
    /// Current API: `Authorization: Bearer` header, camelCase discovery
    /// fields.
    #[default]
    V6,
}

impl ApiVersion {
    /// Version segment used in request paths (`v5` / `v6`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V5 => "v5",
            Self::V6 => "v6",
        }
    }

    /// Path suffix of the base-URI discovery endpoint.
    #[must_use]
    pub fn base_uri_path(self) -> &'static str {
        match self {
            Self::V5 => "base_uris",
            Self::V6 => "baseUris",
        }
    }

    /// Field of the discovery payload holding the API access point.
    #[must_use]
    pub fn access_point_field(self) -> &'static str {
        match self {
            Self::V5 => "api_access_point",
            Self::V6 => "apiAccessPoint",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integration credential for the e-signature service.
///
/// The key value never appears in `Debug` output, so configuration
/// structs holding one can be logged safely.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntegrationKey(String);

impl IntegrationKey {
    /// Wrap a raw key value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Whether the key is empty. Used by configuration validation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Attach this credential to a request, using the header shape the
    /// given API version expects.
    #[must_use]
    pub fn apply(&self, version: ApiVersion, builder: RequestBuilder) -> RequestBuilder {
        match version {
            ApiVersion::V6 => builder.bearer_auth(&self.0),
            ApiVersion::V5 => builder.header("Access-Token", &self.0),
        }
    }
}

impl fmt::Debug for IntegrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IntegrationKey(<redacted>)")
    }
}

impl From<String> for IntegrationKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for IntegrationKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}
