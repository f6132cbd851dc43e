//! Domain primitive types used across the xaas workspace.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, XaasError};

/// Logical name of a declared resource.
///
/// Names are lower-case and restricted to `[a-z0-9.-]` so that the
/// provisioning engine sees the same identifier on every run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceName(String);

impl ResourceName {
    /// Builds a name from arbitrary text, sanitizing it on the way in.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(sanitize(raw.as_ref()))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name is already within `[a-z0-9.-]`.
    ///
    /// Always true for names built with [`ResourceName::new`]; a
    /// deserialized name is taken as-is and may fail.
    #[must_use]
    pub fn is_sanitized(&self) -> bool {
        sanitize(&self.0) == self.0
    }

    /// Appends `-<suffix>` (sanitized) to this name.
    #[must_use]
    pub fn child(&self, suffix: impl AsRef<str>) -> Self {
        Self::new(format!("{}-{}", self.0, suffix.as_ref()))
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lower-cases `raw` and replaces every character outside `[a-z0-9.-]`
/// with `-`.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// SHA-256 hash digest used for content change detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Hashes an in-memory byte slice.
    #[must_use]
    pub fn digest(bytes: &[u8]) -> Self {
        Self(hex(&Sha256::digest(bytes)))
    }

    /// Hashes a file by streaming its contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn of_file(path: &Path) -> Result<Self> {
        let io_err = |source| XaasError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = std::fs::File::open(path).map_err(io_err)?;
        let mut hasher = Sha256::new();
        let _ = std::io::copy(&mut file, &mut hasher).map_err(io_err)?;
        Ok(Self(hex(&hasher.finalize())))
    }

    /// Returns the hex-encoded hash string.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}

/// HTTP method of a gateway route or an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
    /// Matches every method.
    Any,
}

impl HttpMethod {
    /// Upper-case wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Any => "ANY",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = XaasError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "ANY" => Ok(Self::Any),
            _ => Err(XaasError::config(format!("unknown HTTP method: {s}"))),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_lowercases_and_replaces() {
        assert_eq!(sanitize("Cat Nap_01.JPG"), "cat-nap-01.jpg");
        assert_eq!(sanitize("caas-s3-assets"), "caas-s3-assets");
    }

    #[test]
    fn resource_name_child_appends_suffix() {
        let base = ResourceName::new("caas-lambda-facts");
        assert_eq!(base.child("exec-role").as_str(), "caas-lambda-facts-exec-role");
    }

    #[test]
    fn digest_matches_known_vector() {
        let hash = Sha256Hash::digest(b"abc");
        assert_eq!(
            hash.as_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn file_digest_matches_in_memory_digest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, b"hello world").expect("write");
        let from_file = Sha256Hash::of_file(&path).expect("hash file");
        assert_eq!(from_file, Sha256Hash::digest(b"hello world"));
    }

    #[test]
    fn file_digest_spans_multiple_reads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("large.bin");
        let bytes: Vec<u8> = (0..100_000_u32)
            .map(|i| u8::try_from(i % 251).expect("fits"))
            .collect();
        std::fs::write(&path, &bytes).expect("write");
        assert_eq!(
            Sha256Hash::of_file(&path).expect("hash file"),
            Sha256Hash::digest(&bytes)
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Sha256Hash::of_file(&dir.path().join("absent")).expect_err("missing");
        assert!(matches!(err, XaasError::Io { .. }));
    }

    #[test]
    fn deserialized_names_can_escape_sanitization() {
        let built = ResourceName::new("Bad_Name");
        assert!(built.is_sanitized());
        let raw: ResourceName = serde_json::from_str("\"Bad_Name\"").expect("deserialize");
        assert!(!raw.is_sanitized());
    }

    #[test]
    fn http_method_parses_case_insensitively() {
        assert_eq!("delete".parse::<HttpMethod>().expect("parse"), HttpMethod::Delete);
        assert_eq!(HttpMethod::Post.to_string(), "POST");
        assert!("BREW".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn display_has_algorithm_prefix() {
        let hash = Sha256Hash::digest(b"");
        assert!(hash.to_string().starts_with("sha256:"));
    }
}
