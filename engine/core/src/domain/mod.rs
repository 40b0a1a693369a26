// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Models, providers, agents and the persistence contracts the engine
//! consumes from its host.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types, invariants and trait seams; no I/O

pub mod agent;
pub mod backend;
pub mod engine_config;
pub mod error;
pub mod events;
pub mod execution;
pub mod inference;
pub mod model;
pub mod provider;
pub mod repository;
