//! Component upload types.

use std::path::{Path, PathBuf};

use crate::error::{Error, InvalidInputError};

/// Form fields the raw upload format claims for itself.
pub const RESERVED_FIELDS: [&str; 3] = ["raw.directory", "raw.asset1", "raw.asset1.filename"];

/// Extra key/value fields attached to an upload, in insertion order.
///
/// Keys must be non-empty, must not contain `=` or whitespace, and must not
/// shadow one of the [`RESERVED_FIELDS`]. Inserting an existing key
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadProperties(Vec<(String, String)>);

impl UploadProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property, validating the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<(), Error> {
        let key = key.into();
        let value = value.into();
        Self::validate_key(&key)?;

        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
        Ok(())
    }

    /// Parse a `key=value` pair and add it. Surrounding whitespace is
    /// trimmed from both halves; the value may itself contain `=`.
    pub fn insert_pair(&mut self, pair: &str) -> Result<(), Error> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| InvalidInputError::Property {
                value: pair.to_string(),
                reason: "expected key=value".to_string(),
            })?;
        self.insert(key.trim(), value.trim())
    }

    /// Build properties from `key=value` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut properties = Self::new();
        for pair in pairs {
            properties.insert_pair(pair.as_ref())?;
        }
        Ok(properties)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn validate_key(key: &str) -> Result<(), Error> {
        let reason = if key.is_empty() {
            Some("key cannot be empty")
        } else if key.contains('=') {
            Some("key cannot contain '='")
        } else if key.chars().any(char::is_whitespace) {
            Some("key cannot contain whitespace")
        } else if RESERVED_FIELDS.contains(&key) {
            Some("key is reserved for the upload itself")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(InvalidInputError::Property {
                value: key.to_string(),
                reason: reason.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// A single-file component upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Target repository.
    pub repository: String,
    /// Local file to send.
    pub file: PathBuf,
    /// Asset name in the repository; defaults to the file name.
    pub name: Option<String>,
    /// Directory in the repository, `/` for the root.
    pub directory: String,
    pub properties: UploadProperties,
}

impl UploadRequest {
    pub fn new(repository: impl Into<String>, file: impl AsRef<Path>) -> Self {
        Self {
            repository: repository.into(),
            file: file.as_ref().to_path_buf(),
            name: None,
            directory: "/".to_string(),
            properties: UploadProperties::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn with_properties(mut self, properties: UploadProperties) -> Self {
        self.properties = properties;
        self
    }

    /// The name the asset will get in the repository.
    pub fn asset_name(&self) -> Result<String, Error> {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return Ok(name.to_string());
        }

        self.file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                InvalidInputError::Other {
                    message: format!("cannot derive an asset name from {}", self.file.display()),
                }
                .into()
            })
    }

    /// The full repository path the asset will be stored at.
    pub fn asset_path(&self) -> Result<String, Error> {
        let name = self.asset_name()?;
        let directory = self.directory.trim_matches('/');
        if directory.is_empty() {
            Ok(name)
        } else {
            Ok(format!("{}/{}", directory, name))
        }
    }
}

/// Identifies an uploaded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub repository: String,
    /// Repository path of the stored asset.
    pub asset_path: String,
}

impl std::fmt::Display for UploadReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.repository, self.asset_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let properties =
            UploadProperties::from_pairs(["version=1.0.0", "environment=prod", "build=42"]).unwrap();
        let keys: Vec<_> = properties.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["version", "environment", "build"]);
    }

    #[test]
    fn trims_and_allows_equals_in_value() {
        let properties = UploadProperties::from_pairs([" query = a=b "]).unwrap();
        assert_eq!(properties.get("query"), Some("a=b"));
    }

    #[test]
    fn replaces_duplicate_keys_in_place() {
        let properties = UploadProperties::from_pairs(["a=1", "b=2", "a=3"]).unwrap();
        assert_eq!(properties.len(), 2);
        assert_eq!(properties.get("a"), Some("3"));
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert!(UploadProperties::from_pairs(["novalue"]).is_err());
        assert!(UploadProperties::from_pairs(["=value"]).is_err());
        assert!(UploadProperties::from_pairs(["two words=x"]).is_err());
    }

    #[test]
    fn rejects_reserved_keys() {
        let err = UploadProperties::from_pairs(["raw.directory=/x"]).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn asset_name_defaults_to_file_name() {
        let request = UploadRequest::new("raw-hosted", "/tmp/build/myfile.txt");
        assert_eq!(request.asset_name().unwrap(), "myfile.txt");
        assert_eq!(request.asset_path().unwrap(), "myfile.txt");

        let request = request
            .with_name("custom-name.txt")
            .with_directory("/data/files/");
        assert_eq!(request.asset_path().unwrap(), "data/files/custom-name.txt");
    }
}
