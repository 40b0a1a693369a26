// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus - Pub/Sub for Engine Events
//
// In-memory fan-out over a tokio broadcast channel. Emitting never blocks and
// never fails: with no subscribers the event is simply dropped, and slow
// subscribers observe `Lagged` instead of back-pressuring the dispatcher.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::{EngineEvent, EventEmitter, InferenceEvent, ModelEvent};
use crate::domain::model::ModelId;

pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<EngineEvent>>,
}

impl EventBus {
    /// Capacity is the number of events buffered per subscriber before the
    /// oldest are dropped
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }

    pub fn publish(&self, event: EngineEvent) {
        debug!("Publishing event: {}", event.name());

        if self.sender.send(event).is_err() {
            debug!("No subscribers listening to event");
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Only model and inference events concerning `model_id`
    pub fn subscribe_model(&self, model_id: ModelId) -> ModelEventReceiver {
        ModelEventReceiver {
            receiver: self.sender.subscribe(),
            model_id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventEmitter for EventBus {
    fn emit(&self, event: EngineEvent) {
        self.publish(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

pub struct EventReceiver {
    receiver: broadcast::Receiver<EngineEvent>,
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Result<EngineEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    pub fn try_recv(&mut self) -> Result<EngineEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

pub struct ModelEventReceiver {
    receiver: broadcast::Receiver<EngineEvent>,
    model_id: ModelId,
}

impl ModelEventReceiver {
    pub async fn recv(&mut self) -> Result<EngineEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    fn matches(&self, event: &EngineEvent) -> bool {
        let model_id = match event {
            EngineEvent::Model(ModelEvent::ModelRegistered { model_id, .. })
            | EngineEvent::Model(ModelEvent::ModelDeregistered { model_id, .. })
            | EngineEvent::Model(ModelEvent::ModelLoaded { model_id, .. })
            | EngineEvent::Model(ModelEvent::ModelUnloaded { model_id, .. })
            | EngineEvent::Inference(InferenceEvent::ModelExecutionComplete { model_id, .. })
            | EngineEvent::Inference(InferenceEvent::ModelExecutionFailed { model_id, .. }) => model_id,
            EngineEvent::Learning(_) => return false,
        };
        model_id == &self.model_id
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}
