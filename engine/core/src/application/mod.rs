// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application
//!
//! Services that orchestrate the domain: model registry, inference dispatch,
//! execution statistics, agent learning and the [`engine::Engine`] facade
//! that wires them together.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Use-case orchestration over domain types and trait seams

pub mod dispatcher;
pub mod engine;
pub mod learning;
pub mod registry;
pub mod stats;
