//! Artifact store for per-user learned-model state.
//!
//! The only durable state in the engine is the learned estimator's
//! per-user artifact pair (model weights + feature normalizer). This module
//! provides abstractions for storing those blobs via the Repository
//! pattern, allowing different storage backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Service Layer (services::sequence_model)               │
//! │  - Artifact encode/decode + checksum verification       │
//! │  - Per-user training serialization                      │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Trait (repository.rs) - Abstract Interface  │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │   Local (in-memory)          │
//!     │   Filesystem (JSON files)    │
//!     └──────────────────────────────┘
//! ```
//!
//! The repository instance is created once (via [`factory::RepositoryFactory`])
//! and passed explicitly to the services that need it; there is no process
//! global.

#[cfg(not(any(feature = "fs-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod checksum;
pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

pub use checksum::calculate_checksum;
pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
#[cfg(feature = "fs-repo")]
pub use repositories::FsRepository;
#[cfg(feature = "local-repo")]
pub use repositories::LocalRepository;
pub use repository::{
    ArtifactKind, ArtifactRepository, ErrorContext, RepositoryError, RepositoryResult,
    StoredArtifact,
};
