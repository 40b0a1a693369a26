// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! VORTEX CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** `vortex serve` hosts the engine; every other command talks
//!   to a running server through [`client::EngineClient`]

pub mod client;
pub mod commands;
pub mod server;
