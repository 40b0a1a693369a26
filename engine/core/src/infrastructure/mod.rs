// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure
//!
//! Adapters behind the domain trait seams: remote image providers, the
//! simulated local backend, the event bus and storage.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** I/O and third-party integrations

pub mod event_bus;
pub mod local_backend;
pub mod providers;
pub mod storage;
