//! SHA-256 digests and descriptor checksums.

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Marker written in place of a checksum that has not been computed yet.
pub const CHECKSUM_PLACEHOLDER: &str = "PLACEHOLDER";

/// A validated SHA256 digest (64 hex characters)
///
/// This newtype ensures that all digests in the system are validated at deserialization time,
/// preventing invalid hex strings from propagating through the codebase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Create a new `Sha256Digest`, validating the input.
    ///
    /// Accepts strings with or without a `sha256:` prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the hex portion is not exactly 64 ASCII hex characters.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        let hex = s.strip_prefix("sha256:").unwrap_or(&s);

        if hex.len() != 64 {
            anyhow::bail!(
                "Invalid SHA256 digest: expected 64 hex characters, got {} in '{s}'",
                hex.len(),
            );
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("Invalid SHA256 digest: contains non-hex characters in '{s}'");
        }

        Ok(Self(hex.to_lowercase()))
    }

    /// Get the digest as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a hex digest computed elsewhere (case-insensitive).
    pub fn matches(&self, actual: &str) -> bool {
        self.0.eq_ignore_ascii_case(actual)
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Sha256Digest {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Checksum recorded for a variant.
///
/// Release descriptors are authored before the artifacts exist, so a variant may
/// carry [`CHECKSUM_PLACEHOLDER`] until the checksums are filled in. A pending
/// checksum never verifies anything: installing such a variant fails.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Checksum {
    /// Not yet computed (`PLACEHOLDER` in the descriptor).
    #[default]
    Pending,
    /// Known SHA-256 of the artifact.
    Sha256(Sha256Digest),
}

impl Checksum {
    /// Returns the digest, or `None` while the checksum is still pending.
    pub fn digest(&self) -> Option<&Sha256Digest> {
        match self {
            Self::Pending => None,
            Self::Sha256(d) => Some(d),
        }
    }

    /// Whether this checksum is still the placeholder.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Parse a descriptor value: the placeholder marker or a SHA-256 digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither the placeholder nor a valid digest.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() || s.eq_ignore_ascii_case(CHECKSUM_PLACEHOLDER) {
            return Ok(Self::Pending);
        }
        Ok(Self::Sha256(Sha256Digest::new(s)?))
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str(CHECKSUM_PLACEHOLDER),
            Self::Sha256(d) => write!(f, "{d}"),
        }
    }
}

impl From<Sha256Digest> for Checksum {
    fn from(digest: Sha256Digest) -> Self {
        Self::Sha256(digest)
    }
}

impl Serialize for Checksum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
