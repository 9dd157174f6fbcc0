//! Repository implementations module.
//!
//! This module contains different implementations of the `ArtifactRepository` trait:
//! - `local`: In-memory implementation for unit testing and local development
//! - `fs`: Filesystem implementation, one JSON blob per user and artifact kind
#[cfg(feature = "fs-repo")]
pub mod fs;
#[cfg(feature = "local-repo")]
pub mod local;

#[cfg(feature = "fs-repo")]
pub use fs::FsRepository;
#[cfg(feature = "local-repo")]
pub use local::LocalRepository;
