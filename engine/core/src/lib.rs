// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # VORTEX Engine Core
//!
//! Model registry and inference dispatcher for generative-AI models, with
//! per-model execution telemetry and continual-learning state for the
//! HURAII, CLOE and BusinessStrategist agents.
//!
//! | Layer | Contents |
//! |-------|----------|
//! | [`domain`] | descriptors, canonical inference shapes, agents, trait seams |
//! | [`application`] | registry, dispatcher, stats tracker, learning manager, [`Engine`](application::engine::Engine) |
//! | [`infrastructure`] | provider adapters, simulated local backend, event bus, storage |
//! | [`presentation`] | axum HTTP API |

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
