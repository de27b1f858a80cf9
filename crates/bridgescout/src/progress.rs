//! Progress events emitted while a resolution runs.
//!
//! The worker publishes one event per pipeline phase boundary plus
//! per-platform and per-identity notifications; the server relays them to
//! subscribers over SSE. Delivery is best-effort: a slow or absent
//! subscriber never blocks the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::Platform;

/// Event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    NodeStart,
    NodeComplete,
    PlatformResult,
    IdentityFound,
    Complete,
    Error,
}

/// One progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Session the event belongs to.
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: ProgressKind,
    /// Pipeline node name (load, reverse_link, github_direct, fan_out,
    /// aggregate, persist, trace).
    pub node: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Event payload.
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Broadcast bus for progress events. Cheap to clone.
#[derive(Clone)]
pub struct ProgressBus {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressBus {
    /// Create a bus with a bounded backlog; laggy subscribers drop events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to all events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    /// Publish, ignoring the no-subscribers case.
    pub fn publish(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }

    /// Convenience constructor-and-publish.
    pub fn emit(
        &self,
        session_id: &str,
        kind: ProgressKind,
        node: &str,
        platform: Option<Platform>,
        data: serde_json::Value,
    ) {
        self.publish(ProgressEvent {
            session_id: session_id.to_string(),
            kind,
            node: node.to_string(),
            platform,
            data,
            timestamp: Utc::now(),
        });
    }
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new(256)
    }
}
