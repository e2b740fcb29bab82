// src/event_engine/handler/processors.rs

use super::types::{ClientEvent, EventKind, EventResult, UpdateContext};
use crate::core::geometry::HalfSide;
use crate::core::projection::{resolve, NodePath};
use anyhow::Context;
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Key of the assets list inside a node's config entry.
pub const ASSETS_KEY: &str = "assets";

/// Common interface of the per-tag event processors.
pub trait Processor {
    fn process(&self, event: &ClientEvent, ctx: &mut UpdateContext<'_>) -> EventResult;
}

/// Config key for the child on `side`: `#a` left, `#b` right.
pub fn config_key(side: HalfSide) -> &'static str {
    match side {
        HalfSide::Lower => "#a",
        HalfSide::Upper => "#b",
    }
}

// --- near ---
/// Resolves the reported path and records a nested config entry along it;
/// the entry for the reached node receives the delivered assets.
pub struct NearProcessor;

impl Processor for NearProcessor {
    fn process(&self, event: &ClientEvent, ctx: &mut UpdateContext<'_>) -> EventResult {
        if event.event != EventKind::Near {
            anyhow::bail!("Mismatched event type for NearProcessor. Expected near, got {}.", event.event);
        }
        let path = NodePath::from_uri(&event.node_uri);
        let Some(resolved) = resolve(ctx.map, &path) else {
            debug!(uri = %event.node_uri, "near: path does not resolve, ignoring");
            return Ok(());
        };

        let mut entry: &mut Map<String, Value> = &mut ctx.configs;
        for (side, node) in resolved.steps() {
            let child = entry
                .entry(config_key(*side))
                .or_insert_with(|| Value::Object(Map::new()));
            entry = child
                .as_object_mut()
                .with_context(|| format!("config entry for node '{}' is not an object", node.id()))?;
        }

        let node = resolved.node();
        let assets = ctx
            .delivery
            .assets_for(node)
            .with_context(|| format!("asset delivery failed for node '{}'", node.id()))?;
        trace!(node = %node.id(), assets = assets.len(), "near: node resolved");
        if !assets.is_empty() {
            entry.insert(ASSETS_KEY.to_string(), Value::Array(assets));
        }
        Ok(())
    }
}

// --- gone / distant / visible ---
/// Accepts the event without effect.
pub struct PassThroughProcessor;

impl Processor for PassThroughProcessor {
    fn process(&self, event: &ClientEvent, _ctx: &mut UpdateContext<'_>) -> EventResult {
        trace!(event = %event.event, uri = %event.node_uri, "event accepted, no action");
        Ok(())
    }
}
