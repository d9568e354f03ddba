//! Parsing of forge release-download URLs.
//!
//! Variants download from
//! `https://<host>/<owner>/<repo>/releases/download/v<version>/<artifact>`.
//! Pulling the version back out of the URL is how the descriptor checks that
//! every variant points at the release it claims to describe.

use std::sync::LazyLock;

use regex::Regex;

static RELEASE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https://(?P<host>[^/]+)/(?P<owner>[^/]+)/(?P<repo>[^/]+)/releases/download/(?P<tag>[^/]+)/(?P<artifact>[^/?#]+)$",
    )
    .expect("release URL pattern is valid")
});

/// Components of a release-download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseUrl {
    /// Forge host (e.g. `github.com`).
    pub host: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Release tag as it appears in the URL (e.g. `v0.1.2`).
    pub tag: String,
    /// Artifact file name (e.g. `tvshow-x86_64-apple-darwin.tar.gz`).
    pub artifact: String,
}

impl ReleaseUrl {
    /// Parse a URL of the release-download form. Returns `None` for any other shape.
    pub fn parse(url: &str) -> Option<Self> {
        let caps = RELEASE_URL.captures(url)?;
        Some(Self {
            host: caps["host"].to_string(),
            owner: caps["owner"].to_string(),
            repo: caps["repo"].to_string(),
            tag: caps["tag"].to_string(),
            artifact: caps["artifact"].to_string(),
        })
    }

    /// Version embedded in the tag, with the conventional `v` prefix removed.
    pub fn version(&self) -> &str {
        self.tag.strip_prefix('v').unwrap_or(&self.tag)
    }
}
