// src/event_engine/handler/core.rs

use super::delivery::AssetDelivery;
use super::processors::{NearProcessor, PassThroughProcessor, Processor};
use super::types::{ClientEvent, EventKind, EventResult, UpdateContext};
use crate::core::indexing::kdmap::AssetMap;
use anyhow::Context;
use tracing::debug;

/// Processor registered for each event tag. Only `near` does any work.
fn get_processor_for_event(kind: EventKind) -> &'static dyn Processor {
    match kind {
        EventKind::Near => &NearProcessor,
        EventKind::Gone | EventKind::Distant | EventKind::Visible => &PassThroughProcessor,
    }
}

/// Processes a single event against `ctx`.
pub fn process_event(event: &ClientEvent, ctx: &mut UpdateContext<'_>) -> EventResult {
    get_processor_for_event(event.event).process(event, ctx)
}

/// Processes a whole batch in order and returns the accumulated configs,
/// one response per batch.
pub fn process_batch(
    events: &[ClientEvent],
    map: &AssetMap,
    delivery: &dyn AssetDelivery,
) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    let mut ctx = UpdateContext::new(map, delivery);
    for (index, event) in events.iter().enumerate() {
        process_event(event, &mut ctx)
            .with_context(|| format!("event {} ({} {})", index, event.event, event.node_uri))?;
    }
    debug!(events = events.len(), entries = ctx.configs.len(), "processed update batch");
    Ok(ctx.configs)
}
