//! Newtypes for package identity.

use serde::{Deserialize, Serialize};

/// Read-only string access shared by the identity newtypes.
macro_rules! str_newtype {
    ($ty:ident) => {
        impl $ty {
            /// The underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::ops::Deref for $ty {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $ty {
            fn from(s: String) -> Self {
                Self::new(&s)
            }
        }
    };
}

/// A package name, trimmed and lowercased.
///
/// Comparison against plain strings is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Normalize `name`.
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }
}

str_newtype!(PackageName);

impl PartialEq<str> for PackageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.trim().to_lowercase()
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// A release version as written in the descriptor (`0.1.2`).
///
/// [`Version::semver`] parses it on demand. A leading `v` belongs to the tag,
/// not the version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Version(String);

impl Version {
    /// Store `v` as written, minus surrounding whitespace.
    pub fn new(v: &str) -> Self {
        Self(v.trim().to_string())
    }

    /// Parse as a semantic version, if it is one.
    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(&self.0).ok()
    }

    /// Release tag for this version (`v0.1.2`).
    pub fn tag(&self) -> String {
        format!("v{}", self.0)
    }
}

str_newtype!(Version);

/// Semver versions sort numerically and ahead of free-form ones.
impl Ord for Version {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self.semver(), other.semver()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq<str> for Version {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
