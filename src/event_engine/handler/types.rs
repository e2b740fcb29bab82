// src/event_engine/handler/types.rs

use super::delivery::AssetDelivery;
use crate::core::indexing::kdmap::AssetMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Boundary-state change a client reports for one bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Gone,
    Distant,
    Near,
    Visible,
}

impl EventKind {
    pub const ALL: [EventKind; 4] =
        [EventKind::Gone, EventKind::Distant, EventKind::Near, EventKind::Visible];

    pub const fn as_str(self) -> &'static str {
        match self {
            EventKind::Gone => "gone",
            EventKind::Distant => "distant",
            EventKind::Near => "near",
            EventKind::Visible => "visible",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a `getAssetMapUpdates` batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEvent {
    pub event: EventKind,
    #[serde(rename = "nodeURI")]
    pub node_uri: String,
}

impl ClientEvent {
    pub fn new<S: Into<String>>(event: EventKind, node_uri: S) -> Self {
        ClientEvent { event, node_uri: node_uri.into() }
    }
}

/// Everything a processor may read, plus the configs accumulated for the
/// batch response.
pub struct UpdateContext<'a> {
    pub map: &'a AssetMap,
    pub delivery: &'a dyn AssetDelivery,
    pub configs: serde_json::Map<String, serde_json::Value>,
}

impl<'a> UpdateContext<'a> {
    pub fn new(map: &'a AssetMap, delivery: &'a dyn AssetDelivery) -> Self {
        UpdateContext { map, delivery, configs: serde_json::Map::new() }
    }
}

/// Outcome of processing one event.
pub type EventResult = anyhow::Result<()>;
