// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the VORTEX CLI

pub mod agents;
pub mod config;
pub mod endpoints;
pub mod infer;
pub mod models;

pub use self::agents::AgentsCommand;
pub use self::config::ConfigCommand;
pub use self::endpoints::EndpointsCommand;
pub use self::infer::InferArgs;
pub use self::models::ModelsCommand;
