//! Shared types for tvshow release descriptors.
//!
//! A [`ReleaseDescriptor`] names a package, its version, and one prebuilt
//! artifact per [`Platform`]. This crate parses and validates descriptors;
//! `tvshow-core` performs the side effects (download, verify, install).

pub mod arch;
pub mod descriptor;
pub mod hash;
pub mod release_url;
pub mod types;

// Re-exports
pub use arch::*;
pub use descriptor::{
    DescriptorError, InstallStep, PackageInfo, ReleaseDescriptor, ResolvedVariant, TestStep,
    Variant, expand_template,
};
pub use hash::*;
pub use release_url::ReleaseUrl;
pub use types::*;
