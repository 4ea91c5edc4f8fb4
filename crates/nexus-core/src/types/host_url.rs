//! Repository host URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// Path prefix of the versioned REST API.
const REST_PREFIX: &str = "service/rest/v1";

/// A validated repository manager base URL.
///
/// The URL may carry a context path (for instances served below a prefix
/// such as `https://ci.example.com/nexus`). Trailing slashes are
/// normalized away so endpoint construction never produces `//`.
///
/// # Example
///
/// ```
/// use nexus_core::HostUrl;
///
/// let host = HostUrl::new("https://nexus.example.com/").unwrap();
/// assert_eq!(
///     host.rest_url("search/assets"),
///     "https://nexus.example.com/service/rest/v1/search/assets"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HostUrl(Url);

impl HostUrl {
    /// Create a new host URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not an absolute `http(s)` URL
    /// with a host.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref().trim();
        let url = Url::parse(s).map_err(|e| InvalidInputError::HostUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        let mut normalized = url;
        let path = normalized.path().trim_end_matches('/').to_string();
        normalized.set_path(&path);
        normalized.set_query(None);
        normalized.set_fragment(None);

        Ok(Self(normalized))
    }

    /// Returns the URL of a REST API endpoint, e.g. `search/assets`.
    pub fn rest_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base(),
            REST_PREFIX,
            endpoint.trim_start_matches('/')
        )
    }

    /// Returns the canonical content URL of an asset.
    ///
    /// Used when a search result does not carry a `downloadUrl`. Each
    /// path segment is percent-encoded.
    pub fn asset_url(&self, repository: &str, path: &str) -> String {
        let mut url = self.0.clone();
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments
                    .pop_if_empty()
                    .push("repository")
                    .push(repository)
                    .extend(path.split('/').filter(|s| !s.is_empty()));
            }
            // Unreachable for a validated host.
            Err(()) => {
                return format!(
                    "{}/repository/{}/{}",
                    self.base(),
                    repository,
                    path.trim_start_matches('/')
                );
            }
        }
        url.into()
    }

    /// Resolves a possibly relative download URL against this host.
    pub fn resolve(&self, download_url: &str) -> String {
        if download_url.starts_with("http://") || download_url.starts_with("https://") {
            download_url.to_string()
        } else {
            format!("{}/{}", self.base(), download_url.trim_start_matches('/'))
        }
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// Returns true when requests to this host are encrypted.
    pub fn is_https(&self) -> bool {
        self.0.scheme() == "https"
    }

    fn base(&self) -> &str {
        // The URL crate renders an empty path as "/".
        self.0.as_str().trim_end_matches('/')
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::HostUrl {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        let scheme = url.scheme();
        if scheme != "https" && scheme != "http" {
            return Err(InvalidInputError::HostUrl {
                value: original.to_string(),
                reason: format!("unsupported scheme '{}', expected http or https", scheme),
            }
            .into());
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(InvalidInputError::HostUrl {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for HostUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base())
    }
}

impl FromStr for HostUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for HostUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.base())
    }
}

impl<'de> Deserialize<'de> for HostUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        HostUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
