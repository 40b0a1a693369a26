// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Storage Implementations
//!
//! Infrastructure implementations of the persistence contracts defined in
//! [`crate::domain::repository`].
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist engine checkpoints and generated artifacts
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **SledStateStore** - embedded, crash-safe checkpoint storage
//! - **LocalArtifactStore** - artifacts written to a directory on disk
//! - **InMemoryStateStore** / **InMemoryArtifactStore** - ephemeral, for
//!   tests and `--ephemeral` runs

pub mod artifacts;
pub mod memory;
pub mod sled_store;

pub use artifacts::LocalArtifactStore;
pub use memory::{InMemoryArtifactStore, InMemoryStateStore};
pub use sled_store::SledStateStore;
